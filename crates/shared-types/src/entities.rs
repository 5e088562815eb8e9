//! # Entities
//!
//! The records exchanged between services. Expenses and payments are owned
//! by the ledger service; groups and members are owned by the balance
//! service. Both sides serialize these to JSON message bodies, so the
//! field names here are the wire format.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Separator used in the `recipients` wire encoding of an expense.
pub const RECIPIENT_SEPARATOR: char = ';';

/// A supplied identifier was not a valid UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed identifier: {value:?}")]
pub struct MalformedIdentifier {
    /// The raw value that failed to parse.
    pub value: String,
}

/// A group of people sharing expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Current members. Order carries no meaning.
    pub members: Vec<Member>,
}

impl Group {
    /// New empty group with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: Vec::new(),
        }
    }
}

/// A person inside a group, carrying a running signed balance.
///
/// A member may only be removed while the balance is exactly zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member identifier.
    pub id: Uuid,
    /// Name, unique within the owning group.
    pub name: String,
    /// Running balance. Positive means the group owes this member.
    pub balance: Money,
}

impl Member {
    /// New member with a fresh identifier and zero balance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            balance: Money::zero(),
        }
    }
}

/// An expense paid by one member on behalf of others.
///
/// `recipients` is the semicolon-delimited wire encoding of the recipient
/// identifiers, kept as-is so the record round-trips through the bus
/// unchanged. Use [`Expense::recipient_ids`] to get typed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Record identifier.
    pub id: Uuid,
    /// Owning group.
    pub group_id: Uuid,
    /// Free-form description.
    pub description: String,
    /// Positive amount paid.
    pub amount: Money,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Member who paid.
    pub payer: Uuid,
    /// Semicolon-delimited recipient member identifiers.
    pub recipients: String,
}

impl Expense {
    /// New expense dated now, with a fresh identifier.
    pub fn new(
        description: impl Into<String>,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipients: &[Uuid],
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            description: description.into(),
            amount,
            date: Utc::now(),
            payer,
            recipients: encode_recipients(recipients),
        }
    }

    /// Parse the delimited recipient field into typed identifiers.
    ///
    /// # Errors
    ///
    /// [`MalformedIdentifier`] when any segment is not a valid UUID.
    pub fn recipient_ids(&self) -> Result<Vec<Uuid>, MalformedIdentifier> {
        self.recipients
            .split(RECIPIENT_SEPARATOR)
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| MalformedIdentifier {
                    value: raw.to_owned(),
                })
            })
            .collect()
    }
}

/// Encode recipient identifiers into the delimited wire form.
pub fn encode_recipients(recipients: &[Uuid]) -> String {
    recipients
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(&RECIPIENT_SEPARATOR.to_string())
}

/// A direct payment between exactly two members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Record identifier.
    pub id: Uuid,
    /// Owning group.
    pub group_id: Uuid,
    /// When the payment happened.
    pub date: DateTime<Utc>,
    /// Positive amount transferred.
    pub amount: Money,
    /// Member who paid.
    pub payer: Uuid,
    /// Member who received the money.
    pub recipient: Uuid,
}

impl Payment {
    /// New payment dated now, with a fresh identifier.
    pub fn new(amount: Money, group_id: Uuid, payer: Uuid, recipient: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            date: Utc::now(),
            amount,
            payer,
            recipient,
        }
    }
}

/// Body of a `delete-expense` / `delete-payment` command from the edge.
///
/// The edge only names the group; the ledger service decides which record
/// is "the latest" and re-publishes its full fields downstream. Decoding
/// into this struct validates the identifier once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDirective {
    /// Group whose latest record should be removed.
    pub group_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_round_trip() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let expense = Expense::new(
            "groceries",
            Money::from_units(10, 0),
            Uuid::new_v4(),
            Uuid::new_v4(),
            &ids,
        );

        assert_eq!(expense.recipients.matches(';').count(), 2);
        assert_eq!(expense.recipient_ids().unwrap(), ids);
    }

    #[test]
    fn malformed_recipient_segment_is_rejected() {
        let mut expense = Expense::new(
            "dinner",
            Money::from_units(20, 0),
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[Uuid::new_v4()],
        );
        expense.recipients.push_str(";not-a-uuid");

        let err = expense.recipient_ids().unwrap_err();
        assert_eq!(err.value, "not-a-uuid");
    }

    #[test]
    fn expense_wire_format_uses_expected_field_names() {
        let expense = Expense::new(
            "taxi",
            Money::from_units(8, 50),
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[Uuid::new_v4()],
        );

        let value = serde_json::to_value(&expense).unwrap();
        for field in [
            "id",
            "group_id",
            "description",
            "amount",
            "date",
            "payer",
            "recipients",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn delete_directive_rejects_bad_identifier() {
        let result: Result<DeleteDirective, _> =
            serde_json::from_str(r#"{"group_id":"definitely-not-a-uuid"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn new_member_starts_at_zero() {
        let member = Member::new("ada");
        assert!(member.balance.is_zero());
    }
}
