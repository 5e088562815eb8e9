//! # Ledger Manager
//!
//! Business rules over the transaction history. The manager validates
//! identifiers before anything persists and owns the "undo the latest
//! entry" policy: the edge-facing delete command only names a group, so
//! the ledger alone decides which record gets reversed, and returns it so
//! the caller can propagate the exact reversal downstream.

use crate::store::LedgerStore;
use shared_types::{Expense, MalformedIdentifier, Payment};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors from ledger operations. Nothing persists when one is returned.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A supplied identifier is not a valid UUID.
    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifier),

    /// The group has no record of the requested kind.
    #[error("no {kind} found for group {group_id}")]
    NotFound {
        /// `"expense"` or `"payment"`.
        kind: &'static str,
        /// The group that was queried.
        group_id: Uuid,
    },
}

/// Single source of truth for expenses and payments.
pub struct LedgerManager<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerManager<S> {
    /// New manager over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and persist an expense.
    ///
    /// Every recipient identifier must parse as a UUID before the record
    /// is stored; a single malformed segment rejects the whole record.
    ///
    /// # Errors
    ///
    /// [`LedgerError::MalformedIdentifier`] on the first bad recipient.
    pub fn create_expense(&self, expense: &Expense) -> Result<(), LedgerError> {
        expense.recipient_ids()?;
        self.store.insert_expense(expense.clone());
        debug!(expense_id = %expense.id, group_id = %expense.group_id, "expense recorded");
        Ok(())
    }

    /// Remove the group's latest expense and return it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when the group has no expenses; the
    /// store is left unchanged.
    pub fn remove_last_expense(&self, group_id: Uuid) -> Result<Expense, LedgerError> {
        let expense = self
            .store
            .remove_latest_expense(group_id)
            .ok_or(LedgerError::NotFound {
                kind: "expense",
                group_id,
            })?;
        debug!(expense_id = %expense.id, %group_id, "latest expense removed");
        Ok(expense)
    }

    /// Persist a payment.
    pub fn create_payment(&self, payment: &Payment) -> Result<(), LedgerError> {
        self.store.insert_payment(payment.clone());
        debug!(payment_id = %payment.id, group_id = %payment.group_id, "payment recorded");
        Ok(())
    }

    /// Remove the group's latest payment and return it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] when the group has no payments; the
    /// store is left unchanged.
    pub fn remove_last_payment(&self, group_id: Uuid) -> Result<Payment, LedgerError> {
        let payment = self
            .store
            .remove_latest_payment(group_id)
            .ok_or(LedgerError::NotFound {
                kind: "payment",
                group_id,
            })?;
        debug!(payment_id = %payment.id, %group_id, "latest payment removed");
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use shared_types::Money;

    fn manager() -> (LedgerManager<InMemoryLedgerStore>, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        (LedgerManager::new(Arc::clone(&store)), store)
    }

    #[test]
    fn create_then_remove_returns_the_record() {
        let (manager, _) = manager();
        let group_id = Uuid::new_v4();
        let expense = Expense::new(
            "hotel",
            Money::from_units(120, 0),
            group_id,
            Uuid::new_v4(),
            &[Uuid::new_v4(), Uuid::new_v4()],
        );

        manager.create_expense(&expense).unwrap();
        let removed = manager.remove_last_expense(group_id).unwrap();

        assert_eq!(removed, expense);
    }

    #[test]
    fn malformed_recipient_rejects_before_persistence() {
        let (manager, store) = manager();
        let group_id = Uuid::new_v4();
        let mut expense = Expense::new(
            "hotel",
            Money::from_units(120, 0),
            group_id,
            Uuid::new_v4(),
            &[Uuid::new_v4()],
        );
        expense.recipients = "broken;".into();

        let err = manager.create_expense(&expense).unwrap_err();

        assert!(matches!(err, LedgerError::MalformedIdentifier(_)));
        assert_eq!(store.expense_count(group_id), 0);
    }

    #[test]
    fn removing_from_empty_group_is_not_found() {
        let (manager, store) = manager();
        let group_id = Uuid::new_v4();

        assert!(matches!(
            manager.remove_last_expense(group_id),
            Err(LedgerError::NotFound { kind: "expense", .. })
        ));
        assert!(matches!(
            manager.remove_last_payment(group_id),
            Err(LedgerError::NotFound { kind: "payment", .. })
        ));
        assert_eq!(store.expense_count(group_id), 0);
        assert_eq!(store.payment_count(group_id), 0);
    }

    #[test]
    fn payments_round_trip() {
        let (manager, _) = manager();
        let group_id = Uuid::new_v4();
        let payment = Payment::new(
            Money::from_units(25, 30),
            group_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        manager.create_payment(&payment).unwrap();
        assert_eq!(manager.remove_last_payment(group_id).unwrap(), payment);
    }
}
