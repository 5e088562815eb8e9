//! # End-to-End Choreography Tests
//!
//! The full two-hop flow:
//!
//! ```text
//! edge publisher ──add/delete command──→ [transactions queue]
//!                                              │
//!                                        ledger service
//!                                  persists / removes the record
//!                                              │
//!                          resolved record ──→ [balances queue]
//!                                              │
//!                                        balance service
//!                                      applies signed deltas
//! ```
//!
//! Balances are read back through the balance manager, never through the
//! bus, so every assertion observes the same store the service mutates.

#[cfg(test)]
use node_runtime::{NodeRuntime, RuntimeConfig};
#[cfg(test)]
use shared_types::{DeleteDirective, Expense, Money, Operation, Payment};
#[cfg(test)]
use std::time::Duration;
#[cfg(test)]
use uuid::Uuid;

/// Poll until every listed member has the expected balance, or panic
/// after a second. Delivery is asynchronous on both hops, so tests wait
/// for convergence instead of sleeping a fixed interval.
#[cfg(test)]
async fn wait_for_balances(runtime: &NodeRuntime, group_id: Uuid, expected: &[(Uuid, Money)]) {
    let manager = runtime.balance_manager();
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let done = expected.iter().all(|(member, balance)| {
                manager
                    .fetch_member(group_id, *member)
                    .map(|m| m.balance == *balance)
                    .unwrap_or(false)
            });
            if done {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        let manager = runtime.balance_manager();
        let actual: Vec<String> = expected
            .iter()
            .map(|(member, _)| {
                format!(
                    "{member}: {}",
                    manager
                        .fetch_member(group_id, *member)
                        .map(|m| m.balance.to_string())
                        .unwrap_or_else(|_| "missing".into())
                )
            })
            .collect();
        panic!("balances did not converge, current state: {actual:?}");
    });
}

#[cfg(test)]
async fn wait_until(description: &str, condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for: {description}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scenario {
        runtime: NodeRuntime,
        group_id: Uuid,
        a: Uuid,
        b: Uuid,
        c: Uuid,
    }

    /// A group of three with zero balances, the runtime already running.
    fn scenario() -> Scenario {
        let runtime = NodeRuntime::start(RuntimeConfig::default()).unwrap();
        let manager = runtime.balance_manager();
        let group = manager.create_group("trip");
        let a = manager.add_member(group.id, "a").unwrap().id;
        let b = manager.add_member(group.id, "b").unwrap().id;
        let c = manager.add_member(group.id, "c").unwrap().id;
        Scenario {
            runtime,
            group_id: group.id,
            a,
            b,
            c,
        }
    }

    #[tokio::test]
    async fn expense_splits_across_recipients_and_delete_restores_zero() {
        let s = scenario();
        let expense = Expense::new(
            "dinner",
            Money::from_units(23, 30),
            s.group_id,
            s.a,
            &[s.b, s.c],
        );

        s.runtime
            .edge_publisher()
            .publish(Operation::AddExpense, &expense)
            .unwrap();

        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[
                (s.a, Money::from_units(23, 30)),
                (s.b, -Money::from_units(11, 65)),
                (s.c, -Money::from_units(11, 65)),
            ],
        )
        .await;

        // The edge delete carries only the group id; the ledger resolves
        // which record it reverses.
        s.runtime
            .edge_publisher()
            .publish(
                Operation::DeleteExpense,
                &DeleteDirective {
                    group_id: s.group_id,
                },
            )
            .unwrap();

        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[
                (s.a, Money::zero()),
                (s.b, Money::zero()),
                (s.c, Money::zero()),
            ],
        )
        .await;
        assert_eq!(s.runtime.ledger_store().expense_count(s.group_id), 0);
    }

    #[tokio::test]
    async fn payment_transfers_and_delete_reverses_it() {
        let s = scenario();
        let payment = Payment::new(Money::from_units(25, 30), s.group_id, s.a, s.b);

        s.runtime
            .edge_publisher()
            .publish(Operation::AddPayment, &payment)
            .unwrap();

        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[
                (s.a, Money::from_units(25, 30)),
                (s.b, -Money::from_units(25, 30)),
            ],
        )
        .await;

        s.runtime
            .edge_publisher()
            .publish(
                Operation::DeletePayment,
                &DeleteDirective {
                    group_id: s.group_id,
                },
            )
            .unwrap();

        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[(s.a, Money::zero()), (s.b, Money::zero())],
        )
        .await;
        assert_eq!(s.runtime.ledger_store().payment_count(s.group_id), 0);
    }

    #[tokio::test]
    async fn uneven_split_leaks_remainder_to_no_one() {
        let s = scenario();
        let amount = Money::from_units(10, 0);
        let expense = Expense::new("cab", amount, s.group_id, s.a, &[s.a, s.b, s.c]);

        s.runtime
            .edge_publisher()
            .publish(Operation::AddExpense, &expense)
            .unwrap();

        // a pays 10.00 and owes a 3.33 share themselves: +10.00 - 3.33.
        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[
                (s.a, Money::from_cents(667)),
                (s.b, Money::from_cents(-333)),
                (s.c, Money::from_cents(-333)),
            ],
        )
        .await;

        // Net sum is the truncated remainder, not zero. Expected behavior.
        let manager = s.runtime.balance_manager();
        let net: Money = [s.a, s.b, s.c]
            .iter()
            .map(|m| manager.fetch_member(s.group_id, *m).unwrap().balance)
            .sum();
        assert_eq!(net, amount.split_remainder(3));
    }

    #[tokio::test]
    async fn delete_on_empty_ledger_is_dropped_permanently() {
        let s = scenario();
        let broker = s.runtime.broker();
        let transactions = broker.queue_stats("transactions").unwrap();
        let balances = broker.queue_stats("balances").unwrap();

        s.runtime
            .edge_publisher()
            .publish(
                Operation::DeleteExpense,
                &DeleteDirective {
                    group_id: s.group_id,
                },
            )
            .unwrap();

        wait_until("command rejection", || transactions.rejected_count() == 1).await;

        // Nothing was forwarded and nothing will be retried: the command
        // is gone, visible only in the counters.
        assert_eq!(balances.published_count(), 0);
        assert_eq!(transactions.acked_count(), 0);
    }

    #[tokio::test]
    async fn failed_balance_application_loses_only_that_update() {
        let s = scenario();
        let broker = s.runtime.broker();
        let balances = broker.queue_stats("balances").unwrap();

        // Recipient from another group: the ledger accepts the record,
        // the balance service rejects the resolved fact.
        let stranger = Expense::new(
            "ghost",
            Money::from_units(5, 0),
            s.group_id,
            s.a,
            &[Uuid::new_v4()],
        );
        s.runtime
            .edge_publisher()
            .publish(Operation::AddExpense, &stranger)
            .unwrap();
        wait_until("balance-side rejection", || balances.rejected_count() == 1).await;

        // The stores now disagree: the ledger kept the record, balances
        // never moved. A later valid command still flows normally.
        assert_eq!(s.runtime.ledger_store().expense_count(s.group_id), 1);
        let valid = Payment::new(Money::from_units(1, 0), s.group_id, s.a, s.b);
        s.runtime
            .edge_publisher()
            .publish(Operation::AddPayment, &valid)
            .unwrap();
        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[(s.a, Money::from_units(1, 0)), (s.b, -Money::from_units(1, 0))],
        )
        .await;
    }

    #[tokio::test]
    async fn consecutive_commands_apply_in_publish_order() {
        let s = scenario();

        for _ in 0..5 {
            let payment = Payment::new(Money::from_units(1, 0), s.group_id, s.a, s.b);
            s.runtime
                .edge_publisher()
                .publish(Operation::AddPayment, &payment)
                .unwrap();
        }
        s.runtime
            .edge_publisher()
            .publish(
                Operation::DeletePayment,
                &DeleteDirective {
                    group_id: s.group_id,
                },
            )
            .unwrap();

        wait_for_balances(
            &s.runtime,
            s.group_id,
            &[(s.a, Money::from_units(4, 0)), (s.b, -Money::from_units(4, 0))],
        )
        .await;
        assert_eq!(s.runtime.ledger_store().payment_count(s.group_id), 4);
    }

    #[tokio::test]
    async fn shutdown_drains_consumers() {
        let s = scenario();
        let payment = Payment::new(Money::from_units(2, 0), s.group_id, s.a, s.b);
        s.runtime
            .edge_publisher()
            .publish(Operation::AddPayment, &payment)
            .unwrap();
        wait_for_balances(&s.runtime, s.group_id, &[(s.a, Money::from_units(2, 0))]).await;

        tokio::time::timeout(Duration::from_secs(1), s.runtime.shutdown())
            .await
            .expect("shutdown timed out")
            .unwrap();
    }
}
