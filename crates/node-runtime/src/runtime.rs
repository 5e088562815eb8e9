//! # Node Runtime
//!
//! Wires the broker, the ledger service, and the balance service into one
//! process and runs both consumer loops. The two services still share
//! nothing but the bus: each has its own store, and every mutation crosses
//! an envelope.

use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use balance_service::{BalanceManager, BalanceMessageHandler, InMemoryGroupStore};
use ledger_service::{InMemoryLedgerStore, LedgerManager, LedgerMessageHandler};
use shared_bus::{Broker, Consumer, Publisher};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A running node: broker, both services, and their consumer loops.
pub struct NodeRuntime {
    broker: Arc<Broker>,
    edge: Publisher,
    ledger_store: Arc<InMemoryLedgerStore>,
    group_store: Arc<InMemoryGroupStore>,
    shutdown_tx: watch::Sender<bool>,
    consumers: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    /// Validate the config, wire both services, and start their consumers.
    ///
    /// Accepting a command is all the edge publisher guarantees: a
    /// successful publish means "queued for processing", and any failure
    /// past that point is visible only in logs and queue counters, never
    /// to the original caller.
    pub fn start(config: RuntimeConfig) -> Result<Self> {
        config.validate().context("invalid runtime configuration")?;
        info!(
            exchange = %config.exchange,
            transactions_key = %config.transactions_key,
            balances_key = %config.balances_key,
            "starting node"
        );

        let broker = Arc::new(Broker::with_capacity(config.queue_capacity));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Ledger side: consume edge commands, forward resolved facts.
        let ledger_store = Arc::new(InMemoryLedgerStore::new());
        let ledger_consumer = Consumer::new(
            &broker,
            &config.exchange,
            &config.transactions_queue,
            &config.transactions_key,
            "ledger",
        )?;
        let ledger_handler = LedgerMessageHandler::new(
            LedgerManager::new(Arc::clone(&ledger_store)),
            Publisher::new(Arc::clone(&broker), &config.exchange, &config.balances_key),
        );

        // Balance side: consume resolved facts, mutate balances.
        let group_store = Arc::new(InMemoryGroupStore::new());
        let balance_consumer = Consumer::new(
            &broker,
            &config.exchange,
            &config.balances_queue,
            &config.balances_key,
            "balance",
        )?;
        let balance_handler =
            BalanceMessageHandler::new(BalanceManager::new(Arc::clone(&group_store)));

        let consumers = vec![
            ledger_consumer.start(shutdown_rx.clone(), Arc::new(ledger_handler)),
            balance_consumer.start(shutdown_rx, Arc::new(balance_handler)),
        ];

        let edge = Publisher::new(
            Arc::clone(&broker),
            &config.exchange,
            &config.transactions_key,
        );

        Ok(Self {
            broker,
            edge,
            ledger_store,
            group_store,
            shutdown_tx,
            consumers,
        })
    }

    /// The publisher the edge service would use to submit commands.
    pub fn edge_publisher(&self) -> &Publisher {
        &self.edge
    }

    /// A manager over the balance service's store, for the CRUD surface
    /// the edge exposes out-of-band (groups and members are created over
    /// HTTP in the full system, not over the bus).
    pub fn balance_manager(&self) -> BalanceManager<InMemoryGroupStore> {
        BalanceManager::new(Arc::clone(&self.group_store))
    }

    /// The ledger service's store, for inspection.
    pub fn ledger_store(&self) -> &Arc<InMemoryLedgerStore> {
        &self.ledger_store
    }

    /// The broker, for queue counters.
    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Signal shutdown and wait for both consumer loops to finish their
    /// in-flight delivery and exit.
    pub async fn shutdown(self) -> Result<()> {
        info!("shutting down node");
        // Receivers may already be gone if a consumer stopped on its own.
        let _ = self.shutdown_tx.send(true);
        for handle in self.consumers {
            handle.await.context("consumer task panicked")?;
        }
        Ok(())
    }
}
