//! # Publisher
//!
//! The emitting side of the bus. A publisher is pinned to one exchange and
//! one routing key at construction, so a component cannot accidentally
//! publish onto the wrong hop.

use crate::broker::{Broker, PublishError};
use serde::Serialize;
use shared_types::{Envelope, Operation};
use std::sync::Arc;
use tracing::info;

/// Publishes envelopes on a fixed exchange and routing key.
///
/// Publishing durably queues exactly one message per bound queue when it
/// returns `Ok`. There is no internal retry; a failed publish surfaces to
/// the caller unchanged.
pub struct Publisher {
    broker: Arc<Broker>,
    exchange: String,
    routing_key: String,
}

impl Publisher {
    /// New publisher. Declares the exchange up front so publishing cannot
    /// hit an undeclared exchange later.
    pub fn new(broker: Arc<Broker>, exchange: &str, routing_key: &str) -> Self {
        broker.declare_exchange(exchange);
        Self {
            broker,
            exchange: exchange.to_owned(),
            routing_key: routing_key.to_owned(),
        }
    }

    /// Serialize `body`, wrap it for `operation` under a fresh correlation
    /// id, and send it.
    ///
    /// # Errors
    ///
    /// [`PublishError`] when the body cannot be encoded or the broker
    /// rejects delivery.
    pub fn publish<T: Serialize>(
        &self,
        operation: Operation,
        body: &T,
    ) -> Result<(), PublishError> {
        let envelope = Envelope::new(operation, body)?;
        self.publish_envelope(envelope)
    }

    /// Re-emit an already-built envelope, keeping its correlation id.
    ///
    /// The ledger service uses this for the second hop so the resolved
    /// fact stays linked to the command that caused it.
    ///
    /// # Errors
    ///
    /// [`PublishError`] when the broker rejects delivery.
    pub fn publish_envelope(&self, envelope: Envelope) -> Result<(), PublishError> {
        let operation = envelope.operation;
        let correlation_id = envelope.correlation_id;
        let receivers = self
            .broker
            .route(&self.exchange, &self.routing_key, envelope)?;

        info!(
            exchange = %self.exchange,
            routing_key = %self.routing_key,
            %operation,
            %correlation_id,
            receivers,
            "message published"
        );
        Ok(())
    }

    /// The routing key this publisher emits under.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{DeleteDirective, Operation};
    use uuid::Uuid;

    #[test]
    fn publish_declares_its_exchange() {
        let broker = Arc::new(Broker::new());
        let publisher = Publisher::new(Arc::clone(&broker), "payments", "edge");

        // No queue bound: success with zero receivers, not an error.
        publisher
            .publish(
                Operation::DeletePayment,
                &DeleteDirective {
                    group_id: Uuid::new_v4(),
                },
            )
            .unwrap();
    }

    #[test]
    fn publish_reaches_a_bound_queue() {
        let broker = Arc::new(Broker::new());
        broker.declare_queue("ledger");
        let publisher = Publisher::new(Arc::clone(&broker), "payments", "edge");
        broker.bind_queue("ledger", "payments", "edge").unwrap();

        publisher
            .publish(
                Operation::AddPayment,
                &DeleteDirective {
                    group_id: Uuid::new_v4(),
                },
            )
            .unwrap();

        assert_eq!(broker.queue_stats("ledger").unwrap().published_count(), 1);
    }
}
