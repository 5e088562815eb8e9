//! # Shared Bus - Message Broker for Inter-Service Communication
//!
//! The ledger and balance services never call each other and never share a
//! store. Every state change crosses this bus as an [`Envelope`] routed
//! through a durable direct exchange:
//!
//! ```text
//! ┌──────────┐ publish(edge key)  ┌───────────┐ publish(balance key) ┌───────────┐
//! │   edge   │ ──────────────────→│  ledger   │ ────────────────────→│  balance  │
//! │ (caller) │                    │  service  │                      │  service  │
//! └──────────┘                    └───────────┘                      └───────────┘
//!                └── exchange ──┘              └── exchange ──┘
//! ```
//!
//! ## Delivery contract
//!
//! - At-least-once, mediated by a single broker; no deduplication.
//! - A handler returning `Ok` acknowledges the message (removed for good).
//! - A handler returning `Err` rejects it **without requeue**: the message
//!   is dropped and the failure is visible only in logs and counters.
//! - Publishing under a routing key with no bound queue succeeds and
//!   delivers nowhere, matching broker semantics.
//!
//! [`Envelope`]: shared_types::Envelope

pub mod broker;
pub mod consumer;
pub mod publisher;

pub use broker::{Broker, BrokerError, PublishError, QueueStats};
pub use consumer::{Consumer, MessageHandler};
pub use publisher::Publisher;

/// Messages a queue may hold before publishers see an overflow error.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
