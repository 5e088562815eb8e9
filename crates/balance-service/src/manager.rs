//! # Balance Manager
//!
//! Business rules over groups and members: name uniqueness inside a group,
//! zero-balance member removal, and the four balance mutations that every
//! ledger fact resolves into. No other component writes balances.

use crate::store::GroupStore;
use shared_types::{Group, Member, Money};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors from balance operations. Nothing mutates when one is returned.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// No group under the given identifier.
    #[error("no group found: {id}")]
    GroupNotFound {
        /// The unresolved group identifier.
        id: Uuid,
    },

    /// No member under the given identifier inside the stated group.
    #[error("no member found in group {group_id}: {id}")]
    MemberNotFound {
        /// The group that was searched.
        group_id: Uuid,
        /// The unresolved member identifier.
        id: Uuid,
    },

    /// A member with that name already exists in the group.
    #[error("member {name:?} already present in group {group_id}")]
    AlreadyPresent {
        /// The group holding the colliding name.
        group_id: Uuid,
        /// The duplicate name.
        name: String,
    },

    /// The member still owes or is owed money.
    #[error("can't remove member {member_id} with balance {balance}")]
    NonZeroBalance {
        /// The member that was to be removed.
        member_id: Uuid,
        /// Their current balance.
        balance: Money,
    },

    /// An expense named no recipients to split between.
    #[error("expense in group {group_id} has no recipients")]
    NoRecipients {
        /// The group the expense targeted.
        group_id: Uuid,
    },
}

/// Single source of truth for per-member balances.
pub struct BalanceManager<S> {
    store: Arc<S>,
}

impl<S: GroupStore> BalanceManager<S> {
    /// New manager over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an empty group.
    pub fn create_group(&self, name: &str) -> Group {
        let group = Group::new(name);
        self.store.insert_group(group.clone());
        debug!(group_id = %group.id, name, "group created");
        group
    }

    /// Fetch a group with its members.
    pub fn fetch_group(&self, id: Uuid) -> Result<Group, BalanceError> {
        self.store
            .group(id)
            .ok_or(BalanceError::GroupNotFound { id })
    }

    /// Rename a group.
    pub fn update_group(&self, id: Uuid, name: &str) -> Result<(), BalanceError> {
        if self.store.rename_group(id, name) {
            Ok(())
        } else {
            Err(BalanceError::GroupNotFound { id })
        }
    }

    /// Delete a group.
    ///
    /// Member balances are not checked here; only member-level removal
    /// enforces the zero-balance rule.
    pub fn remove_group(&self, id: Uuid) -> Result<(), BalanceError> {
        if self.store.remove_group(id) {
            Ok(())
        } else {
            Err(BalanceError::GroupNotFound { id })
        }
    }

    /// Add a member to a group.
    ///
    /// # Errors
    ///
    /// [`BalanceError::AlreadyPresent`] when the name collides with an
    /// existing member of the same group; the member count is unchanged.
    pub fn add_member(&self, group_id: Uuid, name: &str) -> Result<Member, BalanceError> {
        let group = self.fetch_group(group_id)?;
        if group.members.iter().any(|m| m.name == name) {
            return Err(BalanceError::AlreadyPresent {
                group_id,
                name: name.to_owned(),
            });
        }

        let member = Member::new(name);
        self.store.insert_member(group_id, member.clone());
        debug!(group_id = %group_id, member_id = %member.id, name, "member added");
        Ok(member)
    }

    /// Fetch a member of a group.
    pub fn fetch_member(&self, group_id: Uuid, member_id: Uuid) -> Result<Member, BalanceError> {
        self.store
            .member(group_id, member_id)
            .ok_or(BalanceError::MemberNotFound {
                group_id,
                id: member_id,
            })
    }

    /// Rename a member.
    pub fn update_member(
        &self,
        group_id: Uuid,
        member_id: Uuid,
        name: &str,
    ) -> Result<(), BalanceError> {
        if self.store.rename_member(group_id, member_id, name) {
            Ok(())
        } else {
            Err(BalanceError::MemberNotFound {
                group_id,
                id: member_id,
            })
        }
    }

    /// Remove a member.
    ///
    /// # Errors
    ///
    /// [`BalanceError::NonZeroBalance`] unless the balance is exactly
    /// zero. A single cent either way blocks removal.
    pub fn remove_member(&self, group_id: Uuid, member_id: Uuid) -> Result<(), BalanceError> {
        let member = self.fetch_member(group_id, member_id)?;
        if !member.balance.is_zero() {
            return Err(BalanceError::NonZeroBalance {
                member_id,
                balance: member.balance,
            });
        }

        self.store.remove_member(group_id, member_id);
        debug!(%group_id, %member_id, "member removed");
        Ok(())
    }

    /// Apply an expense: payer gains `amount`, each recipient loses the
    /// truncated per-head share.
    ///
    /// The remainder `amount - n * share` (up to `n-1` cents) is credited
    /// to no one, so the group's net sum may move away from zero. That is
    /// the documented splitting rule.
    ///
    /// # Errors
    ///
    /// [`BalanceError::NoRecipients`] for an empty recipient list,
    /// [`BalanceError::MemberNotFound`] if the payer or any recipient is
    /// not in the group; no balance moves either way.
    pub fn apply_expense(
        &self,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipients: &[Uuid],
    ) -> Result<(), BalanceError> {
        self.apply_signed_expense(amount, group_id, payer, recipients, false)
    }

    /// Exact arithmetic inverse of [`apply_expense`] with the same
    /// arguments: the share is recomputed with the identical truncation,
    /// so apply-then-reverse restores every balance to its prior value.
    ///
    /// [`apply_expense`]: Self::apply_expense
    pub fn reverse_expense(
        &self,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipients: &[Uuid],
    ) -> Result<(), BalanceError> {
        self.apply_signed_expense(amount, group_id, payer, recipients, true)
    }

    fn apply_signed_expense(
        &self,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipients: &[Uuid],
        reverse: bool,
    ) -> Result<(), BalanceError> {
        if recipients.is_empty() {
            return Err(BalanceError::NoRecipients { group_id });
        }
        let share = amount.split_between(recipients.len() as u32);
        let (credit, debit) = if reverse {
            (-amount, share)
        } else {
            (amount, -share)
        };

        let mut deltas = Vec::with_capacity(recipients.len() + 1);
        deltas.push((payer, credit));
        deltas.extend(recipients.iter().map(|r| (*r, debit)));

        self.transact(group_id, &deltas)?;
        debug!(
            %group_id,
            %payer,
            amount = %amount,
            share = %share,
            recipients = recipients.len(),
            reverse,
            "expense applied to balances"
        );
        Ok(())
    }

    /// Apply a payment: payer gains `amount`, recipient loses it. Always
    /// net zero, no rounding.
    pub fn apply_payment(
        &self,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipient: Uuid,
    ) -> Result<(), BalanceError> {
        self.transact(group_id, &[(payer, amount), (recipient, -amount)])
    }

    /// Exact inverse of [`apply_payment`] with the same arguments.
    ///
    /// [`apply_payment`]: Self::apply_payment
    pub fn reverse_payment(
        &self,
        amount: Money,
        group_id: Uuid,
        payer: Uuid,
        recipient: Uuid,
    ) -> Result<(), BalanceError> {
        self.transact(group_id, &[(payer, -amount), (recipient, amount)])
    }

    fn transact(&self, group_id: Uuid, deltas: &[(Uuid, Money)]) -> Result<(), BalanceError> {
        if self.store.apply_deltas(group_id, deltas) {
            return Ok(());
        }
        if self.store.group(group_id).is_none() {
            return Err(BalanceError::GroupNotFound { id: group_id });
        }
        // The store cannot say which row was missing; report the first
        // member it cannot have matched.
        let id = deltas
            .iter()
            .map(|(id, _)| *id)
            .find(|id| self.store.member(group_id, *id).is_none())
            .unwrap_or(group_id);
        Err(BalanceError::MemberNotFound { group_id, id })
    }
}
