//! # Edge-Hop Handler
//!
//! Consumes commands from the edge queue, mutates the ledger, and
//! re-publishes the resolved record on the balance hop. An `add-*` command
//! already carries the full record; a `delete-*` command carries only the
//! group id, and the re-published message carries the removed record's
//! actual fields. The correlation id of the inbound command is preserved
//! on the outbound message.
//!
//! Any error returned here makes the consumer reject the command without
//! requeue, so a failed command is permanently dropped after logging.

use crate::manager::LedgerManager;
use crate::store::LedgerStore;
use anyhow::Context;
use async_trait::async_trait;
use shared_bus::{MessageHandler, Publisher};
use shared_types::{DeleteDirective, Envelope, Expense, Operation, Payment};
use tracing::info;

/// Ledger-side message handler: persist or reverse, then forward.
pub struct LedgerMessageHandler<S> {
    manager: LedgerManager<S>,
    forward: Publisher,
}

impl<S: LedgerStore> LedgerMessageHandler<S> {
    /// New handler forwarding resolved records through `forward`, which
    /// must be bound to the balance-hop routing key.
    pub fn new(manager: LedgerManager<S>, forward: Publisher) -> Self {
        Self { manager, forward }
    }

    fn add_expense(&self, envelope: &Envelope) -> anyhow::Result<()> {
        let expense: Expense = envelope
            .decode()
            .context("message body is not a valid expense")?;
        self.manager.create_expense(&expense)?;

        let out =
            Envelope::with_correlation(Operation::AddExpense, envelope.correlation_id, &expense)?;
        self.forward.publish_envelope(out)?;
        Ok(())
    }

    fn delete_expense(&self, envelope: &Envelope) -> anyhow::Result<()> {
        let directive: DeleteDirective = envelope
            .decode()
            .context("message body is not a valid delete directive")?;
        let removed = self.manager.remove_last_expense(directive.group_id)?;
        info!(
            group_id = %directive.group_id,
            expense_id = %removed.id,
            "latest expense resolved for reversal"
        );

        let out =
            Envelope::with_correlation(Operation::DeleteExpense, envelope.correlation_id, &removed)?;
        self.forward.publish_envelope(out)?;
        Ok(())
    }

    fn add_payment(&self, envelope: &Envelope) -> anyhow::Result<()> {
        let payment: Payment = envelope
            .decode()
            .context("message body is not a valid payment")?;
        self.manager.create_payment(&payment)?;

        let out =
            Envelope::with_correlation(Operation::AddPayment, envelope.correlation_id, &payment)?;
        self.forward.publish_envelope(out)?;
        Ok(())
    }

    fn delete_payment(&self, envelope: &Envelope) -> anyhow::Result<()> {
        let directive: DeleteDirective = envelope
            .decode()
            .context("message body is not a valid delete directive")?;
        let removed = self.manager.remove_last_payment(directive.group_id)?;
        info!(
            group_id = %directive.group_id,
            payment_id = %removed.id,
            "latest payment resolved for reversal"
        );

        let out =
            Envelope::with_correlation(Operation::DeletePayment, envelope.correlation_id, &removed)?;
        self.forward.publish_envelope(out)?;
        Ok(())
    }
}

#[async_trait]
impl<S: LedgerStore> MessageHandler for LedgerMessageHandler<S> {
    async fn handle(&self, envelope: &Envelope) -> anyhow::Result<()> {
        match envelope.operation {
            Operation::AddExpense => self.add_expense(envelope),
            Operation::DeleteExpense => self.delete_expense(envelope),
            Operation::AddPayment => self.add_payment(envelope),
            Operation::DeletePayment => self.delete_payment(envelope),
        }
    }
}
