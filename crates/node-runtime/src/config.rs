//! # Runtime Configuration
//!
//! Broker topology for the two hops. Both services bind to the same
//! exchange; each owns a dedicated queue under its own routing key, so
//! either side can scale its consumers independently.

use thiserror::Error;

/// Configuration errors caught before anything starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A topology name was left empty.
    #[error("empty name for {field}")]
    EmptyName {
        /// Which field was empty.
        field: &'static str,
    },

    /// Both hops share a routing key, which would deliver edge commands
    /// straight to the balance service.
    #[error("edge and balance hops must use distinct routing keys")]
    SharedRoutingKey,
}

/// Broker topology and channel sizing for one node.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// The single durable direct exchange both services share.
    pub exchange: String,
    /// Queue consumed by the ledger service.
    pub transactions_queue: String,
    /// Routing key for the edge→ledger hop.
    pub transactions_key: String,
    /// Queue consumed by the balance service.
    pub balances_queue: String,
    /// Routing key for the ledger→balance hop.
    pub balances_key: String,
    /// Messages a queue may hold before publishers see overflow.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            exchange: "tally".into(),
            transactions_queue: "transactions".into(),
            transactions_key: "transactions".into(),
            balances_queue: "balances".into(),
            balances_key: "balances".into(),
            queue_capacity: shared_bus::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Validate the topology before wiring anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("exchange", &self.exchange),
            ("transactions_queue", &self.transactions_queue),
            ("transactions_key", &self.transactions_key),
            ("balances_queue", &self.balances_queue),
            ("balances_key", &self.balances_key),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyName { field });
            }
        }
        if self.transactions_key == self.balances_key {
            return Err(ConfigError::SharedRoutingKey);
        }
        Ok(())
    }
}
