//! # Broker
//!
//! Single-process stand-in for a real message broker, keeping the broker's
//! observable semantics: named direct exchanges, durable queues, explicit
//! bindings, and routing that silently delivers nowhere when a key has no
//! bound queue. A distributed deployment would swap this for an AMQP
//! client behind the same surface.

use crate::DEFAULT_QUEUE_CAPACITY;
use shared_types::{Envelope, EnvelopeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Structural errors from exchange/queue topology operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The named exchange was never declared.
    #[error("exchange {exchange:?} is not declared")]
    ExchangeNotDeclared {
        /// Exchange name.
        exchange: String,
    },

    /// The named queue was never declared.
    #[error("queue {queue:?} is not declared")]
    QueueNotDeclared {
        /// Queue name.
        queue: String,
    },

    /// A bound queue is at capacity and cannot take the message.
    #[error("queue {queue:?} is full")]
    QueueOverflow {
        /// Queue name.
        queue: String,
    },
}

/// Errors surfaced to a publisher. Never retried internally; retry, if
/// any, is the caller's responsibility.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker rejected the delivery.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The message body could not be serialized.
    #[error(transparent)]
    Encode(#[from] EnvelopeError),
}

/// Per-queue delivery accounting, observable by tests and operators.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Messages routed into the queue.
    pub published: AtomicU64,
    /// Messages handed to a consumer.
    pub delivered: AtomicU64,
    /// Messages acknowledged after successful handling.
    pub acked: AtomicU64,
    /// Messages rejected without requeue (permanently dropped).
    pub rejected: AtomicU64,
}

impl QueueStats {
    pub(crate) fn count_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages rejected so far.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Messages acknowledged so far.
    pub fn acked_count(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }

    /// Messages routed into the queue so far.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Shared receive side of a queue. Consumers take turns on the lock, so
/// several instances may compete over one queue.
pub(crate) type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Envelope>>>;

struct Queue {
    tx: mpsc::Sender<Envelope>,
    rx: SharedReceiver,
    stats: Arc<QueueStats>,
}

#[derive(Default)]
struct Exchange {
    /// Routing key to the queues bound under it.
    bindings: HashMap<String, Vec<String>>,
}

#[derive(Default)]
struct State {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, Queue>,
}

/// The broker: owns all exchanges, queues, and bindings.
///
/// Topology operations are idempotent, so the two services may declare the
/// same exchange in any startup order.
pub struct Broker {
    state: Mutex<State>,
    capacity: usize,
}

impl Broker {
    /// New broker with the default per-queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// New broker holding at most `capacity` messages per queue.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            capacity,
        }
    }

    /// Declare a durable direct exchange. Idempotent.
    pub fn declare_exchange(&self, name: &str) {
        let mut state = self.lock_state();
        state.exchanges.entry(name.to_owned()).or_default();
    }

    /// Declare a durable queue. Idempotent.
    pub fn declare_queue(&self, name: &str) {
        let mut state = self.lock_state();
        if !state.queues.contains_key(name) {
            let (tx, rx) = mpsc::channel(self.capacity);
            state.queues.insert(
                name.to_owned(),
                Queue {
                    tx,
                    rx: Arc::new(tokio::sync::Mutex::new(rx)),
                    stats: Arc::new(QueueStats::default()),
                },
            );
        }
    }

    /// Bind `queue` to `exchange` under `routing_key`. Idempotent.
    ///
    /// # Errors
    ///
    /// [`BrokerError`] when either side of the binding is not declared.
    pub fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        let mut state = self.lock_state();
        if !state.queues.contains_key(queue) {
            return Err(BrokerError::QueueNotDeclared {
                queue: queue.to_owned(),
            });
        }
        let ex = state.exchanges.get_mut(exchange).ok_or_else(|| {
            BrokerError::ExchangeNotDeclared {
                exchange: exchange.to_owned(),
            }
        })?;

        let bound = ex.bindings.entry(routing_key.to_owned()).or_default();
        if !bound.iter().any(|q| q == queue) {
            bound.push(queue.to_owned());
        }
        Ok(())
    }

    /// Route an envelope through `exchange` under `routing_key`.
    ///
    /// Returns the number of queues that received the message. Zero is a
    /// success: an unbound key fails silently at publish time, exactly as
    /// a direct exchange does, so a misconfigured key shows up only as a
    /// warning in the publisher's logs.
    ///
    /// # Errors
    ///
    /// [`BrokerError::ExchangeNotDeclared`] for an unknown exchange,
    /// [`BrokerError::QueueOverflow`] when any bound queue is full, in
    /// which case no queue receives the message.
    pub fn route(
        &self,
        exchange: &str,
        routing_key: &str,
        envelope: Envelope,
    ) -> Result<usize, BrokerError> {
        let state = self.lock_state();
        let ex = state
            .exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotDeclared {
                exchange: exchange.to_owned(),
            })?;

        let Some(bound) = ex.bindings.get(routing_key) else {
            warn!(
                exchange,
                routing_key,
                operation = %envelope.operation,
                "message dropped (no queue bound under routing key)"
            );
            return Ok(0);
        };

        // Capacity only grows while the topology lock is held, so checking
        // every bound queue first keeps multi-queue delivery all-or-nothing:
        // either every queue takes the message or none does.
        for name in bound {
            // Bindings only ever reference declared queues.
            if state.queues[name].tx.capacity() == 0 {
                return Err(BrokerError::QueueOverflow {
                    queue: name.clone(),
                });
            }
        }

        let mut receivers = 0;
        for name in bound {
            let queue = &state.queues[name];
            queue
                .tx
                .try_send(envelope.clone())
                .map_err(|_| BrokerError::QueueOverflow {
                    queue: name.clone(),
                })?;
            queue.stats.count_published();
            receivers += 1;
        }

        debug!(
            exchange,
            routing_key,
            operation = %envelope.operation,
            correlation_id = %envelope.correlation_id,
            receivers,
            "message routed"
        );
        Ok(receivers)
    }

    /// Delivery counters for a declared queue.
    pub fn queue_stats(&self, queue: &str) -> Result<Arc<QueueStats>, BrokerError> {
        let state = self.lock_state();
        state
            .queues
            .get(queue)
            .map(|q| Arc::clone(&q.stats))
            .ok_or_else(|| BrokerError::QueueNotDeclared {
                queue: queue.to_owned(),
            })
    }

    pub(crate) fn receiver(&self, queue: &str) -> Result<SharedReceiver, BrokerError> {
        let state = self.lock_state();
        state
            .queues
            .get(queue)
            .map(|q| Arc::clone(&q.rx))
            .ok_or_else(|| BrokerError::QueueNotDeclared {
                queue: queue.to_owned(),
            })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        // Topology lock is never held across an await point.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
