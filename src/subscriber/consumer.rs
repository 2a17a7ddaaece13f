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

use super::lease::pull_leased;
use super::options::PullOptions;
use super::processor::MessageProcessor;
use crate::stub::SubscriptionService;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

/// How long the worker waits before polling again when the service had no
/// messages available or the pull failed.
const POLL_BACKOFF: Duration = Duration::from_millis(250);

/// A running callback-based message consumer.
///
/// The consumer pulls messages from a subscription and runs a
/// [MessageProcessor] on each one, with at most
/// [max_queued_callbacks][PullOptions::max_queued_callbacks] callbacks in
/// flight. A callback returning `Ok` acknowledges its message, a callback
/// returning an error nacks it, and ack deadlines are extended automatically
/// while callbacks run.
///
/// The consumer runs until [close][MessageConsumer::close] is called.
/// Closing stops the dispatch of new callbacks and waits for in-flight
/// callbacks to finish. Dropping the consumer without closing stops dispatch
/// but does not wait.
///
/// # Example
/// ```no_run
/// # use pubsub_subscription::client::PubSub;
/// # use pubsub_subscription::subscriber::{BoxError, PullOptions};
/// # async fn sample(client: PubSub) -> anyhow::Result<()> {
/// use futures::FutureExt;
/// let consumer = client.subscribe(
///     "projects/p/subscriptions/s",
///     |message| async move {
///         println!("received {message:?}");
///         Ok::<(), BoxError>(())
///     }
///     .boxed(),
///     PullOptions::new(),
/// );
/// // ...
/// consumer.close().await;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct MessageConsumer {
    shutdown: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl MessageConsumer {
    pub(crate) fn start(
        service: Arc<dyn SubscriptionService>,
        subscription: String,
        processor: Arc<dyn MessageProcessor>,
        options: PullOptions,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(run(
            service,
            subscription,
            processor,
            options,
            shutdown.clone(),
        ));
        Self {
            shutdown,
            worker: Some(worker),
        }
    }

    /// Stops the consumer.
    ///
    /// No new callbacks are dispatched after this call, and messages pulled
    /// but not yet dispatched are nacked. In-flight callbacks run to
    /// completion before this method returns.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for MessageConsumer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run(
    service: Arc<dyn SubscriptionService>,
    subscription: String,
    processor: Arc<dyn MessageProcessor>,
    options: PullOptions,
    shutdown: CancellationToken,
) {
    let semaphore = Arc::new(Semaphore::new(options.max_queued_callbacks));
    let mut callbacks = JoinSet::new();
    loop {
        // Wait until there is capacity for at least one more callback.
        let permit = tokio::select! {
            _ = shutdown.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        // Pull as many messages as there is capacity for. The held permit
        // accounts for the first message.
        let budget = (semaphore.available_permits() + 1) as u32;
        let pull = pull_leased(
            &service,
            &subscription,
            budget,
            options.ack_deadline_seconds,
        );
        let messages = tokio::select! {
            _ = shutdown.cancelled() => break,
            messages = pull => messages,
        };
        let messages = match messages {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("pull failed for {subscription}: {e}");
                drop(permit);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = sleep(POLL_BACKOFF) => continue,
                }
            }
        };
        if messages.is_empty() {
            drop(permit);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(POLL_BACKOFF) => continue,
            }
        }
        let mut permit = Some(permit);
        for message in messages {
            let permit = match permit.take() {
                Some(permit) => permit,
                None => tokio::select! {
                    // Dropping the remaining messages nacks them through
                    // their lease.
                    _ = shutdown.cancelled() => break,
                    permit = semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                },
            };
            let processor = processor.clone();
            callbacks.spawn(async move {
                let _permit = permit;
                match processor.process(message.message().clone()).await {
                    Ok(()) => message.ack(),
                    Err(e) => {
                        tracing::warn!("callback failed, message will be redelivered: {e}");
                        message.nack();
                    }
                }
            });
        }
        // Reap finished callbacks so the set does not grow without bound.
        while callbacks.try_join_next().is_some() {}
    }
    // Graceful drain: let in-flight callbacks finish.
    while callbacks.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PubsubMessage, ReceivedMessage};
    use crate::stub::tests::MockService;
    use futures::FutureExt;
    use tokio::sync::Notify;
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

    #[tokio::test(start_paused = true)]
    async fn successful_callbacks_ack() -> anyhow::Result<()> {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        let mut first = Some(test_batch(0..3));
        mock.expect_pull()
            .returning(move |_, _| Ok(first.take().unwrap_or_default()));
        mock.expect_acknowledge().returning(move |_, ids| {
            for id in ids {
                ack_tx.send(id).expect("sending on channel always succeeds");
            }
            Ok(())
        });
        mock.expect_modify_ack_deadline().returning(|_, _, _| Ok(()));

        let consumer = MessageConsumer::start(
            Arc::new(mock),
            SUBSCRIPTION.to_string(),
            Arc::new(|_message: PubsubMessage| async move { Ok::<(), crate::subscriber::BoxError>(()) }.boxed()),
            PullOptions::new(),
        );

        let mut acked = Vec::new();
        for _ in 0..3 {
            acked.push(ack_rx.recv().await.expect("three acks"));
        }
        assert_eq!(sorted(acked), test_ids(0..3));

        consumer.close().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failed_callbacks_nack() -> anyhow::Result<()> {
        let (nack_tx, mut nack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        let mut first = Some(test_batch(0..2));
        mock.expect_pull()
            .returning(move |_, _| Ok(first.take().unwrap_or_default()));
        mock.expect_acknowledge().returning(|_, _| Ok(()));
        mock.expect_modify_ack_deadline()
            .returning(move |_, ids, deadline| {
                if deadline == 0 {
                    for id in ids {
                        nack_tx
                            .send(id)
                            .expect("sending on channel always succeeds");
                    }
                }
                Ok(())
            });

        let consumer = MessageConsumer::start(
            Arc::new(mock),
            SUBSCRIPTION.to_string(),
            Arc::new(|_message: PubsubMessage| {
                async move { Err::<(), crate::subscriber::BoxError>("boom".into()) }.boxed()
            }),
            PullOptions::new(),
        );

        let mut nacked = Vec::new();
        for _ in 0..2 {
            nacked.push(nack_rx.recv().await.expect("two nacks"));
        }
        assert_eq!(sorted(nacked), test_ids(0..2));

        consumer.close().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pull_size_bounded_by_queue_depth() -> anyhow::Result<()> {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        let mut batches = vec![test_batch(2..4), test_batch(0..2)];
        mock.expect_pull().returning(move |_, max| {
            assert!(max <= 2, "max={max}");
            Ok(batches.pop().unwrap_or_default())
        });
        mock.expect_acknowledge().returning(move |_, ids| {
            for id in ids {
                ack_tx.send(id).expect("sending on channel always succeeds");
            }
            Ok(())
        });
        mock.expect_modify_ack_deadline().returning(|_, _, _| Ok(()));

        let consumer = MessageConsumer::start(
            Arc::new(mock),
            SUBSCRIPTION.to_string(),
            Arc::new(|_message: PubsubMessage| async move { Ok::<(), crate::subscriber::BoxError>(()) }.boxed()),
            PullOptions::new().set_max_queued_callbacks(2_usize),
        );

        let mut acked = Vec::new();
        for _ in 0..4 {
            acked.push(ack_rx.recv().await.expect("four acks"));
        }
        assert_eq!(sorted(acked), test_ids(0..4));

        consumer.close().await;
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn close_drains_in_flight_callbacks() -> anyhow::Result<()> {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (ack_tx, mut ack_rx) = unbounded_channel();

        let mut mock = MockService::new();
        let mut first = Some(test_batch(0..1));
        mock.expect_pull()
            .returning(move |_, _| Ok(first.take().unwrap_or_default()));
        mock.expect_acknowledge().returning(move |_, ids| {
            for id in ids {
                ack_tx.send(id).expect("sending on channel always succeeds");
            }
            Ok(())
        });
        mock.expect_modify_ack_deadline().returning(|_, _, _| Ok(()));

        let processor = {
            let started = started.clone();
            let release = release.clone();
            move |_message: PubsubMessage| {
                let started = started.clone();
                let release = release.clone();
                async move {
                    started.notify_one();
                    release.notified().await;
                    Ok::<(), crate::subscriber::BoxError>(())
                }
                .boxed()
            }
        };

        let consumer = MessageConsumer::start(
            Arc::new(mock),
            SUBSCRIPTION.to_string(),
            Arc::new(processor),
            PullOptions::new(),
        );

        // Wait for the callback to start, then close while it is blocked.
        started.notified().await;
        let close = tokio::spawn(consumer.close());
        release.notify_one();
        close.await?;

        // The in-flight callback ran to completion and acked its message.
        let acked = ack_rx.recv().await.expect("one ack");
        assert_eq!(acked, "ack-000");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pull_errors_do_not_stop_the_consumer() -> anyhow::Result<()> {
        let (ack_tx, mut ack_rx) = unbounded_channel();
        let mut mock = MockService::new();
        let mut responses = vec![
            Ok(test_batch(0..1)),
            Err(crate::Error::service("unavailable")),
        ];
        mock.expect_pull()
            .returning(move |_, _| responses.pop().unwrap_or_else(|| Ok(Vec::new())));
        mock.expect_acknowledge().returning(move |_, ids| {
            for id in ids {
                ack_tx.send(id).expect("sending on channel always succeeds");
            }
            Ok(())
        });
        mock.expect_modify_ack_deadline().returning(|_, _, _| Ok(()));

        let consumer = MessageConsumer::start(
            Arc::new(mock),
            SUBSCRIPTION.to_string(),
            Arc::new(|_message: PubsubMessage| async move { Ok::<(), crate::subscriber::BoxError>(()) }.boxed()),
            PullOptions::new(),
        );

        // The first pull fails; the consumer backs off and the second pull
        // succeeds.
        let acked = ack_rx.recv().await.expect("one ack");
        assert_eq!(acked, "ack-000");

        consumer.close().await;
        Ok(())
    }
}
