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

use super::lease::Settle;
use crate::model::{PubsubMessage, ReceivedMessage};
use tokio::sync::mpsc::UnboundedSender;

/// A pulled message under lease management.
///
/// While this handle is alive, the lease task keeps extending the message's
/// ack deadline. Call [ack][LeasedMessage::ack] once the message has been
/// processed, or [nack][LeasedMessage::nack] to request redelivery. Dropping
/// the handle without settling nacks the message when the lease shuts down.
///
/// # Example
/// ```no_run
/// # use pubsub_subscription::client::PubSub;
/// # async fn sample(client: PubSub) -> anyhow::Result<()> {
/// let messages = client.pull("projects/p/subscriptions/s", 100).await?;
/// for message in messages {
///     println!("received {:?}", message.message());
///     message.ack();
/// }
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct LeasedMessage {
    ack_id: String,
    message: PubsubMessage,
    settle_tx: UnboundedSender<Settle>,
}

impl LeasedMessage {
    pub(crate) fn new(received: ReceivedMessage, settle_tx: UnboundedSender<Settle>) -> Self {
        Self {
            ack_id: received.ack_id,
            message: received.message,
            settle_tx,
        }
    }

    /// Returns the message payload.
    pub fn message(&self) -> &PubsubMessage {
        &self.message
    }

    /// Returns the ack id for this delivery of the message.
    pub fn ack_id(&self) -> &str {
        &self.ack_id
    }

    /// Acknowledge the message and stop extending its ack deadline.
    ///
    /// Note that the acknowledgement is best effort. The message may still be
    /// redelivered to this client, or another client.
    pub fn ack(self) {
        let _ = self.settle_tx.send(Settle::Ack(self.ack_id));
    }

    /// Reject the message and stop extending its ack deadline.
    ///
    /// The service will redeliver the message, possibly to another client.
    pub fn nack(self) {
        let _ = self.settle_tx.send(Settle::Nack(self.ack_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::unbounded_channel;

    fn test_message(v: i32) -> ReceivedMessage {
        ReceivedMessage::new()
            .set_ack_id(format!("ack-{v}"))
            .set_message(PubsubMessage::new().set_data(bytes::Bytes::from(format!("data-{v}"))))
    }

    #[test]
    fn accessors() {
        let (settle_tx, _settle_rx) = unbounded_channel();
        let m = LeasedMessage::new(test_message(1), settle_tx);
        assert_eq!(m.ack_id(), "ack-1");
        assert_eq!(m.message().data, bytes::Bytes::from_static(b"data-1"));
    }

    #[test]
    fn ack() -> anyhow::Result<()> {
        let (settle_tx, mut settle_rx) = unbounded_channel();
        let m = LeasedMessage::new(test_message(1), settle_tx);
        assert_eq!(settle_rx.try_recv(), Err(TryRecvError::Empty));

        m.ack();
        assert_eq!(settle_rx.try_recv()?, Settle::Ack("ack-1".to_string()));
        Ok(())
    }

    #[test]
    fn nack() -> anyhow::Result<()> {
        let (settle_tx, mut settle_rx) = unbounded_channel();
        let m = LeasedMessage::new(test_message(2), settle_tx);
        assert_eq!(settle_rx.try_recv(), Err(TryRecvError::Empty));

        m.nack();
        assert_eq!(settle_rx.try_recv()?, Settle::Nack("ack-2".to_string()));
        Ok(())
    }

    #[test]
    fn drop_closes_channel() {
        let (settle_tx, mut settle_rx) = unbounded_channel();
        let m = LeasedMessage::new(test_message(3), settle_tx);
        drop(m);
        assert_eq!(settle_rx.try_recv(), Err(TryRecvError::Disconnected));
    }
}
