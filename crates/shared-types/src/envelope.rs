//! # Message Envelope
//!
//! The universal wrapper for every message exchanged between services.
//!
//! An envelope tags an opaque JSON body with the operation being requested
//! plus delivery metadata (content type, persistence, priority). Envelopes
//! are immutable once published and carry no identity of their own; the
//! `correlation_id` links the edge-hop command to the balance-hop fact it
//! resolves into, for observability only. Nothing deduplicates on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Content type marker carried by every envelope.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Fixed priority assigned to every published message.
pub const DEFAULT_PRIORITY: u8 = 1;

/// The operation a message asks its consumer to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Record a new expense and propagate its balance deltas.
    AddExpense,
    /// Remove the group's latest expense and reverse its deltas.
    DeleteExpense,
    /// Record a new payment and propagate its transfer.
    AddPayment,
    /// Remove the group's latest payment and reverse its transfer.
    DeletePayment,
}

impl Operation {
    /// The wire name, e.g. `add-expense`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddExpense => "add-expense",
            Self::DeleteExpense => "delete-expense",
            Self::AddPayment => "add-payment",
            Self::DeletePayment => "delete-payment",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add-expense" => Ok(Self::AddExpense),
            "delete-expense" => Ok(Self::DeleteExpense),
            "add-payment" => Ok(Self::AddPayment),
            "delete-payment" => Ok(Self::DeletePayment),
            other => Err(EnvelopeError::UnknownOperation {
                operation: other.to_owned(),
            }),
        }
    }
}

/// Whether the broker should survive a restart with this message intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Message may be lost on broker restart.
    Transient,
    /// Message is durably queued.
    Persistent,
}

/// Errors raised while building or interpreting an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The operation header did not name a known operation.
    #[error("unknown operation: {operation:?}")]
    UnknownOperation {
        /// The unrecognized header value.
        operation: String,
    },

    /// The body could not be serialized to JSON.
    #[error("body serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A message plus its operation tag and delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// What the consumer should do with the body.
    pub operation: Operation,
    /// Causation identifier preserved across the edge hop and the balance
    /// hop, so logs from both services can be joined.
    pub correlation_id: Uuid,
    /// MIME type of the body.
    pub content_type: String,
    /// Persistence requested from the broker.
    pub delivery_mode: DeliveryMode,
    /// Priority hint. Every publisher in this system uses the same fixed
    /// value, so it never reorders anything in practice.
    pub priority: u8,
    /// Serialized JSON body: an expense, a payment, or a delete directive.
    pub body: Vec<u8>,
}

impl Envelope {
    /// Wrap `body` for `operation` under a fresh correlation id.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Serialize`] when the body cannot be encoded.
    pub fn new<T: Serialize>(operation: Operation, body: &T) -> Result<Self, EnvelopeError> {
        Self::with_correlation(operation, Uuid::new_v4(), body)
    }

    /// Wrap `body` for `operation`, preserving an existing correlation id.
    ///
    /// Used on the second hop so the resolved fact stays linked to the
    /// command that caused it.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::Serialize`] when the body cannot be encoded.
    pub fn with_correlation<T: Serialize>(
        operation: Operation,
        correlation_id: Uuid,
        body: &T,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self {
            operation,
            correlation_id,
            content_type: CONTENT_TYPE_JSON.to_owned(),
            delivery_mode: DeliveryMode::Persistent,
            priority: DEFAULT_PRIORITY,
            body: serde_json::to_vec(body)?,
        })
    }

    /// Decode the body as `T`.
    ///
    /// # Errors
    ///
    /// [`serde_json::Error`] when the body is not valid JSON for `T`.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
