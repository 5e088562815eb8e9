//! # Consumer
//!
//! The receiving side of the bus. A consumer declares its exchange, queue,
//! and binding idempotently before accepting work, so the two services may
//! start in any order. The receive loop hands each envelope to a handler
//! and acknowledges or rejects based on the result.
//!
//! ## Rejection is permanent
//!
//! A rejected message is dropped, never requeued. That trades poison-
//! message loops for silent loss on transient failures: a store hiccup
//! while handling a delivery loses that update and may desynchronize the
//! two services. The loss is observable through [`QueueStats`] and logs.
//!
//! [`QueueStats`]: crate::broker::QueueStats

use crate::broker::{Broker, BrokerError, QueueStats, SharedReceiver};
use async_trait::async_trait;
use shared_types::Envelope;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handles one delivered message at a time.
///
/// `Ok` acknowledges the message; any `Err` rejects it without requeue.
/// Handlers receive the whole envelope so the operation tag, correlation
/// id, and opaque body are all available.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process a delivery.
    async fn handle(&self, envelope: &Envelope) -> anyhow::Result<()>;
}

/// Consumes one queue, one delivery at a time.
///
/// Several consumer instances may be created for the same queue; they
/// compete for deliveries, and ordering across instances is not
/// guaranteed.
pub struct Consumer {
    queue: String,
    tag: String,
    receiver: SharedReceiver,
    stats: Arc<QueueStats>,
}

impl Consumer {
    /// New consumer. Declares `exchange`, `queue`, and the binding between
    /// them under `routing_key`, all idempotently.
    ///
    /// # Errors
    ///
    /// [`BrokerError`] if the binding cannot be established.
    pub fn new(
        broker: &Arc<Broker>,
        exchange: &str,
        queue: &str,
        routing_key: &str,
        tag: &str,
    ) -> Result<Self, BrokerError> {
        broker.declare_exchange(exchange);
        broker.declare_queue(queue);
        broker.bind_queue(queue, exchange, routing_key)?;

        Ok(Self {
            queue: queue.to_owned(),
            tag: tag.to_owned(),
            receiver: broker.receiver(queue)?,
            stats: broker.queue_stats(queue)?,
        })
    }

    /// Start the receive loop on a spawned task.
    ///
    /// Cancellation is cooperative: the loop exits once `shutdown` flips
    /// to `true` (or its sender is dropped), but a handler already running
    /// is allowed to finish first.
    pub fn start(
        self,
        mut shutdown: watch::Receiver<bool>,
        handler: Arc<dyn MessageHandler>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(queue = %self.queue, tag = %self.tag, "consumer started");

            loop {
                if *shutdown.borrow() {
                    break;
                }

                let envelope = {
                    let mut rx = self.receiver.lock().await;
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                            continue;
                        }
                        maybe = rx.recv() => match maybe {
                            Some(envelope) => envelope,
                            // Queue sender gone: broker dropped.
                            None => break,
                        },
                    }
                };

                self.stats.count_delivered();
                debug!(
                    queue = %self.queue,
                    tag = %self.tag,
                    operation = %envelope.operation,
                    correlation_id = %envelope.correlation_id,
                    "message received"
                );

                match handler.handle(&envelope).await {
                    Ok(()) => {
                        self.stats.count_acked();
                        debug!(
                            queue = %self.queue,
                            operation = %envelope.operation,
                            correlation_id = %envelope.correlation_id,
                            "message acknowledged"
                        );
                    }
                    Err(error) => {
                        self.stats.count_rejected();
                        warn!(
                            queue = %self.queue,
                            operation = %envelope.operation,
                            correlation_id = %envelope.correlation_id,
                            %error,
                            "message rejected, dropped without requeue"
                        );
                    }
                }
            }

            info!(queue = %self.queue, tag = %self.tag, "consumer stopped");
        })
    }
}
