//! # Balance-Hop Handler
//!
//! Consumes resolved facts from the ledger service and turns them into
//! balance mutations: `add-*` applies deltas, `delete-*` applies the exact
//! inverse. By the time a message arrives here the record carries concrete
//! amounts and parties, even for deletes.
//!
//! Any error returned here makes the consumer reject the message without
//! requeue; the two stores then disagree until a compensating command
//! arrives. That is the accepted trade-off of the protocol.

use crate::manager::BalanceManager;
use crate::store::GroupStore;
use anyhow::Context;
use async_trait::async_trait;
use shared_bus::MessageHandler;
use shared_types::{Envelope, Expense, Operation, Payment};

/// Balance-side message handler: apply or reverse deltas.
pub struct BalanceMessageHandler<S> {
    manager: BalanceManager<S>,
}

impl<S: GroupStore> BalanceMessageHandler<S> {
    /// New handler over the balance manager.
    pub fn new(manager: BalanceManager<S>) -> Self {
        Self { manager }
    }

    fn handle_expense(&self, envelope: &Envelope, reverse: bool) -> anyhow::Result<()> {
        let expense: Expense = envelope
            .decode()
            .context("message body is not a valid expense")?;
        let recipients = expense.recipient_ids()?;

        if reverse {
            self.manager.reverse_expense(
                expense.amount,
                expense.group_id,
                expense.payer,
                &recipients,
            )?;
        } else {
            self.manager.apply_expense(
                expense.amount,
                expense.group_id,
                expense.payer,
                &recipients,
            )?;
        }
        Ok(())
    }

    fn handle_payment(&self, envelope: &Envelope, reverse: bool) -> anyhow::Result<()> {
        let payment: Payment = envelope
            .decode()
            .context("message body is not a valid payment")?;

        if reverse {
            self.manager.reverse_payment(
                payment.amount,
                payment.group_id,
                payment.payer,
                payment.recipient,
            )?;
        } else {
            self.manager.apply_payment(
                payment.amount,
                payment.group_id,
                payment.payer,
                payment.recipient,
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: GroupStore> MessageHandler for BalanceMessageHandler<S> {
    async fn handle(&self, envelope: &Envelope) -> anyhow::Result<()> {
        match envelope.operation {
            Operation::AddExpense => self.handle_expense(envelope, false),
            Operation::DeleteExpense => self.handle_expense(envelope, true),
            Operation::AddPayment => self.handle_payment(envelope, false),
            Operation::DeletePayment => self.handle_payment(envelope, true),
        }
    }
}
