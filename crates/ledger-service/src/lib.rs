//! # Ledger Service
//!
//! Single source of truth for the transaction history: every expense and
//! payment lands here first, and only this service decides which record a
//! group-level delete command actually reverses.
//!
//! ## Flow
//!
//! ```text
//! edge hop queue ──→ LedgerMessageHandler
//!                        │  add-*:    validate + persist record
//!                        │  delete-*: remove latest record for the group
//!                        ↓
//!                    re-publish resolved record on the balance hop
//! ```
//!
//! The delete command from the edge carries only a group identifier; the
//! re-published message carries the removed record's actual fields, so the
//! balance service can compute the exact reversal.

pub mod handler;
pub mod manager;
pub mod store;

pub use handler::LedgerMessageHandler;
pub use manager::{LedgerError, LedgerManager};
pub use store::{InMemoryLedgerStore, LedgerStore};
