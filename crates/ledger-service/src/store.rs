//! # Ledger Store
//!
//! Port over the relational layer. The store only does keyed inserts and
//! "remove the latest record for a group"; all validation lives in the
//! manager. "Latest" is a total order: date descending, then insertion
//! sequence descending, so two records sharing a timestamp resolve to the
//! one inserted last.

use shared_types::{Expense, Payment};
use std::sync::Mutex;
use uuid::Uuid;

/// Storage seam for the transaction history.
pub trait LedgerStore: Send + Sync {
    /// Append an expense record.
    fn insert_expense(&self, expense: Expense);

    /// Remove and return the group's latest expense, if any.
    fn remove_latest_expense(&self, group_id: Uuid) -> Option<Expense>;

    /// Append a payment record.
    fn insert_payment(&self, payment: Payment);

    /// Remove and return the group's latest payment, if any.
    fn remove_latest_payment(&self, group_id: Uuid) -> Option<Payment>;
}

/// In-memory adapter used by the single-process runtime and the tests.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    inner: Mutex<Records>,
}

#[derive(Default)]
struct Records {
    /// Records paired with a monotonically increasing insertion sequence,
    /// the tie-breaker for identical dates.
    expenses: Vec<(u64, Expense)>,
    payments: Vec<(u64, Payment)>,
    next_seq: u64,
}

impl Records {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl InMemoryLedgerStore {
    /// New empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored expenses for a group.
    pub fn expense_count(&self, group_id: Uuid) -> usize {
        let inner = self.lock();
        inner
            .expenses
            .iter()
            .filter(|(_, e)| e.group_id == group_id)
            .count()
    }

    /// Number of stored payments for a group.
    pub fn payment_count(&self, group_id: Uuid) -> usize {
        let inner = self.lock();
        inner
            .payments
            .iter()
            .filter(|(_, p)| p.group_id == group_id)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert_expense(&self, expense: Expense) {
        let mut inner = self.lock();
        let seq = inner.next_seq();
        inner.expenses.push((seq, expense));
    }

    fn remove_latest_expense(&self, group_id: Uuid) -> Option<Expense> {
        let mut inner = self.lock();
        let index = inner
            .expenses
            .iter()
            .enumerate()
            .filter(|(_, (_, e))| e.group_id == group_id)
            .max_by_key(|(_, (seq, e))| (e.date, *seq))
            .map(|(index, _)| index)?;
        Some(inner.expenses.remove(index).1)
    }

    fn insert_payment(&self, payment: Payment) {
        let mut inner = self.lock();
        let seq = inner.next_seq();
        inner.payments.push((seq, payment));
    }

    fn remove_latest_payment(&self, group_id: Uuid) -> Option<Payment> {
        let mut inner = self.lock();
        let index = inner
            .payments
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.group_id == group_id)
            .max_by_key(|(_, (seq, p))| (p.date, *seq))
            .map(|(index, _)| index)?;
        Some(inner.payments.remove(index).1)
    }
}
