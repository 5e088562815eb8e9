//! # Tally Node Runtime
//!
//! Entry point wiring for the shared-expense system. One process hosts:
//!
//! - the in-process broker with one durable direct exchange,
//! - the ledger service consuming the edge hop,
//! - the balance service consuming the balance hop.
//!
//! ```text
//! edge publisher ──(transactions key)──→ [transactions queue] → ledger service
//!                                                                    │
//!                                     [balances queue] ←─(balances key)
//!                                           │
//!                                           ↓
//!                                     balance service
//! ```
//!
//! The runtime's user-visible contract is fire-and-forget: a successful
//! publish means the command was accepted for processing, not that it
//! succeeded downstream.

pub mod config;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig};
pub use runtime::NodeRuntime;
