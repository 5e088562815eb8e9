//! # Balance Service
//!
//! Single source of truth for groups, members, and running balances. It
//! never hears from the ledger service directly; resolved facts arrive on
//! the balance hop of the bus and are applied as signed deltas inside one
//! atomic store transaction.
//!
//! ## Splitting rule
//!
//! An expense credits the payer with the full amount and debits each
//! recipient with the per-head share truncated to the lower cent. The
//! truncated remainder (up to `n-1` cents for `n` recipients) is credited
//! to no one, so a group's net balance sum may drift upward. Reversal
//! recomputes the identical truncated share with flipped signs, so
//! apply-then-reverse restores every balance exactly.

pub mod handler;
pub mod manager;
pub mod store;

pub use handler::BalanceMessageHandler;
pub use manager::{BalanceError, BalanceManager};
pub use store::{GroupStore, InMemoryGroupStore};
