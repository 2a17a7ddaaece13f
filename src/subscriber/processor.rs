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

use crate::model::PubsubMessage;

/// The error type returned by message processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A callback invoked by a [MessageConsumer][super::MessageConsumer] on each
/// pulled message.
///
/// Returning `Ok(())` acknowledges the message. Returning an error nacks it,
/// and the service will redeliver it. The message's ack deadline is extended
/// automatically while the callback runs.
///
/// Any async closure from a message to a boxed future implements this trait:
///
/// ```
/// # use pubsub_subscription::model::PubsubMessage;
/// # use pubsub_subscription::subscriber::BoxError;
/// use futures::FutureExt;
/// let processor = |message: PubsubMessage| {
///     async move {
///         println!("received {message:?}");
///         Ok::<(), BoxError>(())
///     }
///     .boxed()
/// };
/// ```
#[async_trait::async_trait]
pub trait MessageProcessor: Send + Sync + 'static {
    /// Process one message.
    async fn process(&self, message: PubsubMessage) -> std::result::Result<(), BoxError>;
}

#[async_trait::async_trait]
impl<F> MessageProcessor for F
where
    F: Fn(PubsubMessage) -> futures::future::BoxFuture<'static, std::result::Result<(), BoxError>>
        + Send
        + Sync
        + 'static,
{
    async fn process(&self, message: PubsubMessage) -> std::result::Result<(), BoxError> {
        (self)(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn closures_are_processors() -> anyhow::Result<()> {
        let processor = |message: PubsubMessage| {
            async move {
                if message.data.is_empty() {
                    return Err::<(), BoxError>("empty payload".into());
                }
                Ok(())
            }
            .boxed()
        };

        let ok = processor
            .process(PubsubMessage::new().set_data(bytes::Bytes::from_static(b"x")))
            .await;
        assert!(ok.is_ok(), "{ok:?}");

        let err = processor.process(PubsubMessage::new()).await;
        assert!(err.is_err(), "{err:?}");
        Ok(())
    }
}
