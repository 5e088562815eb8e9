//! # Shared Types
//!
//! Types shared by the ledger and balance services and the message bus:
//!
//! - [`Money`] - exact two-decimal currency stored as integer cents
//! - [`entities`] - groups, members, expenses, payments, delete directives
//! - [`envelope`] - the wire envelope and operation tags carried by every
//!   inter-service message
//!
//! Nothing in this crate performs I/O; it only defines data and the
//! arithmetic on it.

pub mod entities;
pub mod envelope;
pub mod money;

pub use entities::{DeleteDirective, Expense, Group, MalformedIdentifier, Member, Payment};
pub use envelope::{DeliveryMode, Envelope, EnvelopeError, Operation};
pub use money::Money;
