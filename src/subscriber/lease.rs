// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::handler::LeasedMessage;
use crate::Result;
use crate::stub::SubscriptionService;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval_at};

/// The decision an application makes about a leased message.
#[derive(Debug, PartialEq)]
pub(crate) enum Settle {
    Ack(String),
    Nack(String),
}

/// A handle on a lease management task.
pub(crate) struct Lease {
    pub(crate) settle_tx: UnboundedSender<Settle>,

    /// Awaiting this handle is useful for setting expectations in unit
    /// tests. Production code just detaches the task.
    #[allow(dead_code)]
    pub(crate) task: JoinHandle<()>,
}

/// Pulls a batch of messages and places them under lease management.
///
/// Each returned message's ack deadline is extended until the application
/// acks or nacks it. `max_messages == 0` returns an empty batch without
/// calling the service.
pub(crate) async fn pull_leased(
    service: &Arc<dyn SubscriptionService>,
    subscription: &str,
    max_messages: u32,
    ack_deadline_seconds: u32,
) -> Result<Vec<LeasedMessage>> {
    if max_messages == 0 {
        return Ok(Vec::new());
    }
    let pulled = service.pull(subscription, max_messages).await?;
    if pulled.is_empty() {
        return Ok(Vec::new());
    }
    let ack_ids = pulled.iter().map(|m| m.ack_id.clone()).collect();
    let lease = spawn(
        service.clone(),
        subscription.to_string(),
        ack_ids,
        ack_deadline_seconds,
    );
    Ok(pulled
        .into_iter()
        .map(|m| LeasedMessage::new(m, lease.settle_tx.clone()))
        .collect())
}

/// Spawns a task managing the leases of one pulled batch.
///
/// The task extends the ack deadline of all outstanding messages every half
/// deadline, and applies acks and nacks as they arrive on the settle channel.
/// The task ends when every sender is gone; any message still outstanding at
/// that point was dropped by the application, and is nacked so the service
/// can redeliver it.
///
/// All service calls made by this task are best effort. A failed extension or
/// acknowledgement only means the message may be redelivered.
pub(crate) fn spawn(
    service: Arc<dyn SubscriptionService>,
    subscription: String,
    ack_ids: Vec<String>,
    ack_deadline_seconds: u32,
) -> Lease {
    let (settle_tx, settle_rx) = unbounded_channel();
    let task = tokio::spawn(run(
        service,
        subscription,
        ack_ids,
        ack_deadline_seconds,
        settle_rx,
    ));
    Lease { settle_tx, task }
}

async fn run(
    service: Arc<dyn SubscriptionService>,
    subscription: String,
    ack_ids: Vec<String>,
    ack_deadline_seconds: u32,
    mut settle_rx: UnboundedReceiver<Settle>,
) {
    let mut outstanding: BTreeSet<String> = ack_ids.into_iter().collect();
    let period = Duration::from_secs((ack_deadline_seconds as u64 / 2).max(1));
    let mut extend = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            settle = settle_rx.recv() => {
                let Some(settle) = settle else { break };
                // Batch any decisions that are already waiting.
                let mut acks = Vec::new();
                let mut nacks = Vec::new();
                stage(&mut outstanding, settle, &mut acks, &mut nacks);
                while let Ok(settle) = settle_rx.try_recv() {
                    stage(&mut outstanding, settle, &mut acks, &mut nacks);
                }
                if !acks.is_empty() {
                    best_effort(&subscription, service.acknowledge(&subscription, acks).await);
                }
                if !nacks.is_empty() {
                    best_effort(
                        &subscription,
                        service.modify_ack_deadline(&subscription, nacks, 0).await,
                    );
                }
            }
            _ = extend.tick() => {
                if outstanding.is_empty() {
                    continue;
                }
                let ids = outstanding.iter().cloned().collect();
                best_effort(
                    &subscription,
                    service
                        .modify_ack_deadline(&subscription, ids, ack_deadline_seconds)
                        .await,
                );
            }
        }
    }
    // Whatever was not settled was dropped without a decision. Return it to
    // the service for redelivery.
    if !outstanding.is_empty() {
        let ids = outstanding.into_iter().collect();
        best_effort(
            &subscription,
            service.modify_ack_deadline(&subscription, ids, 0).await,
        );
    }
}

fn stage(
    outstanding: &mut BTreeSet<String>,
    settle: Settle,
    acks: &mut Vec<String>,
    nacks: &mut Vec<String>,
) {
    match settle {
        Settle::Ack(id) => {
            outstanding.remove(&id);
            acks.push(id);
        }
        Settle::Nack(id) => {
            outstanding.remove(&id);
            nacks.push(id);
        }
    }
}

fn best_effort(subscription: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!("lease operation failed for {subscription}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PubsubMessage, ReceivedMessage};
    use crate::stub::tests::MockService;
    use tokio::sync::mpsc::unbounded_channel;

    const SUBSCRIPTION: &str = "projects/p/subscriptions/s";

    fn test_ids(range: std::ops::Range<i32>) -> Vec<String> {
        range.map(|i| format!("ack-{i:03}")).collect()
    }

    fn test_batch(range: std::ops::Range<i32>) -> Vec<ReceivedMessage> {
        range
            .map(|i| {
                ReceivedMessage::new()
                    .set_ack_id(format!("ack-{i:03}"))
                    .set_message(
                        PubsubMessage::new().set_data(bytes::Bytes::from(format!("data-{i}"))),
                    )
            })
            .collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[tokio::test]
    async fn acks_are_batched_and_sent() -> anyhow::Result<()> {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        mock.expect_acknowledge().returning(move |name, ids| {
            assert_eq!(name, SUBSCRIPTION);
            ack_tx.send(ids).expect("sending on channel always succeeds");
            Ok(())
        });

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let lease = spawn(service, SUBSCRIPTION.to_string(), test_ids(0..3), 10);
        for id in test_ids(0..3) {
            lease.settle_tx.send(Settle::Ack(id))?;
        }
        drop(lease.settle_tx);
        lease.task.await?;

        let mut acked = Vec::new();
        while let Ok(mut ids) = ack_rx.try_recv() {
            acked.append(&mut ids);
        }
        assert_eq!(sorted(acked), test_ids(0..3));
        Ok(())
    }

    #[tokio::test]
    async fn nacks_use_zero_deadline() -> anyhow::Result<()> {
        let (nack_tx, mut nack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        mock.expect_modify_ack_deadline()
            .returning(move |name, ids, deadline| {
                assert_eq!(name, SUBSCRIPTION);
                assert_eq!(deadline, 0);
                nack_tx
                    .send(ids)
                    .expect("sending on channel always succeeds");
                Ok(())
            });

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let lease = spawn(service, SUBSCRIPTION.to_string(), test_ids(0..2), 10);
        for id in test_ids(0..2) {
            lease.settle_tx.send(Settle::Nack(id))?;
        }
        drop(lease.settle_tx);
        lease.task.await?;

        let mut nacked = Vec::new();
        while let Ok(mut ids) = nack_rx.try_recv() {
            nacked.append(&mut ids);
        }
        assert_eq!(sorted(nacked), test_ids(0..2));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn outstanding_messages_are_extended() -> anyhow::Result<()> {
        let (extend_tx, mut extend_rx) = unbounded_channel();
        let mut mock = MockService::new();
        mock.expect_modify_ack_deadline()
            .returning(move |_, ids, deadline| {
                if deadline != 0 {
                    extend_tx
                        .send((ids, deadline))
                        .expect("sending on channel always succeeds");
                }
                Ok(())
            });

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let lease = spawn(service, SUBSCRIPTION.to_string(), test_ids(0..5), 10);

        // Half the deadline passes and the whole batch is still outstanding,
        // so one extension for all of it should go out.
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        let (ids, deadline) = extend_rx.recv().await.expect("one extension");
        assert_eq!(sorted(ids), test_ids(0..5));
        assert_eq!(deadline, 10);

        drop(lease.settle_tx);
        lease.task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn dropped_messages_are_nacked_on_shutdown() -> anyhow::Result<()> {
        let (nack_tx, mut nack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        mock.expect_acknowledge().returning(|_, _| Ok(()));
        mock.expect_modify_ack_deadline()
            .returning(move |_, ids, deadline| {
                if deadline == 0 {
                    nack_tx
                        .send(ids)
                        .expect("sending on channel always succeeds");
                }
                Ok(())
            });

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let lease = spawn(service, SUBSCRIPTION.to_string(), test_ids(0..6), 10);
        // Ack the first two, drop the rest without a decision.
        for id in test_ids(0..2) {
            lease.settle_tx.send(Settle::Ack(id))?;
        }
        drop(lease.settle_tx);
        lease.task.await?;

        let nacked = nack_rx.try_recv()?;
        assert_eq!(sorted(nacked), test_ids(2..6));
        Ok(())
    }

    #[tokio::test]
    async fn service_failures_are_swallowed() -> anyhow::Result<()> {
        let mut mock = MockService::new();
        mock.expect_acknowledge()
            .returning(|_, _| Err(crate::Error::service("unavailable")));
        mock.expect_modify_ack_deadline()
            .returning(|_, _, _| Err(crate::Error::service("unavailable")));

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let lease = spawn(service, SUBSCRIPTION.to_string(), test_ids(0..2), 10);
        lease.settle_tx.send(Settle::Ack("ack-000".to_string()))?;
        drop(lease.settle_tx);
        // The task still completes cleanly.
        lease.task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn pull_leased_zero_skips_the_service() -> anyhow::Result<()> {
        // The mock has no expectations, so any call would panic.
        let service: Arc<dyn SubscriptionService> = Arc::new(MockService::new());
        let messages = pull_leased(&service, SUBSCRIPTION, 0, 10).await?;
        assert!(messages.is_empty(), "{messages:?}");
        Ok(())
    }

    #[tokio::test]
    async fn pull_leased_wraps_messages() -> anyhow::Result<()> {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        mock.expect_pull().return_once(|name, max| {
            assert_eq!(name, SUBSCRIPTION);
            assert_eq!(max, 100);
            Ok(test_batch(0..3))
        });
        mock.expect_acknowledge().returning(move |_, ids| {
            ack_tx.send(ids).expect("sending on channel always succeeds");
            Ok(())
        });

        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let messages = pull_leased(&service, SUBSCRIPTION, 100, 10).await?;
        assert_eq!(
            messages.iter().map(|m| m.ack_id().to_string()).collect::<Vec<_>>(),
            test_ids(0..3)
        );
        for message in messages {
            message.ack();
        }

        let mut acked = Vec::new();
        while let Some(mut ids) = ack_rx.recv().await {
            acked.append(&mut ids);
            if acked.len() == 3 {
                break;
            }
        }
        assert_eq!(sorted(acked), test_ids(0..3));
        Ok(())
    }

    #[tokio::test]
    async fn pull_leased_propagates_errors() {
        let mut mock = MockService::new();
        mock.expect_pull()
            .return_once(|_, _| Err(crate::Error::service("unavailable")));
        let service: Arc<dyn SubscriptionService> = Arc::new(mock);
        let err = pull_leased(&service, SUBSCRIPTION, 10, 10)
            .await
            .expect_err("pull errors surface to the caller");
        assert_eq!(err.kind(), crate::error::ErrorKind::Service);
    }
}
