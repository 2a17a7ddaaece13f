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

//! The subscription resource handle.

use crate::Result;
use crate::client::{ClientConfig, PubSub};
use crate::model::{Policy, PushConfig, SubscriptionConfig};
use crate::subscriber::{LeasedMessage, MessageConsumer, MessageProcessor, PullOptions};
use std::sync::OnceLock;

/// A handle to a Pub/Sub subscription.
///
/// A subscription represents the stream of messages from a single, specific
/// topic, to be delivered to the subscribing application, either by server
/// push to a preconfigured endpoint (see [PushConfig]) or by client pull.
///
/// The handle pairs an immutable configuration snapshot with a service
/// client; every operation delegates to the client, keyed by the
/// subscription's [name][Subscription::name]. Handles never mutate: to get a
/// handle with the most recent server-side configuration use
/// [reload][Subscription::reload], which returns a new instance.
///
/// Handles serialize. The service reference is not part of the persisted
/// state; it is re-created on first use from the persisted [ClientConfig],
/// through the process-wide
/// [ServiceFactory][crate::client::ServiceFactory].
///
/// # Example
/// ```no_run
/// # use pubsub_subscription::client::PubSub;
/// # async fn sample(client: PubSub) -> anyhow::Result<()> {
/// let subscription = client
///     .get_subscription("projects/my-project/subscriptions/my-subscription")
///     .await?
///     .expect("subscription exists");
/// for message in subscription.pull(100).await? {
///     println!("received {:?}", message.message());
///     message.ack();
/// }
/// # Ok(()) }
/// ```
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(flatten)]
    config: SubscriptionConfig,
    client_config: ClientConfig,
    #[serde(skip)]
    service: OnceLock<PubSub>,
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        // The service reference never participates: two handles are equal
        // when their configurations and client configurations match.
        self.config == other.config && self.client_config == other.client_config
    }
}

impl Subscription {
    /// Returns a builder for [Subscription] handles bound to `client`.
    pub fn builder(client: &PubSub) -> SubscriptionBuilder {
        SubscriptionBuilder {
            config: SubscriptionConfig::new(),
            client_config: client.config().clone(),
            service: OnceLock::from(client.clone()),
        }
    }

    /// Creates a handle from a configuration snapshot returned by the
    /// service.
    pub fn from_config(client: &PubSub, config: SubscriptionConfig) -> Self {
        Self {
            config,
            client_config: client.config().clone(),
            service: OnceLock::from(client.clone()),
        }
    }

    /// Returns a builder initialized with this handle's configuration.
    pub fn to_builder(&self) -> SubscriptionBuilder {
        SubscriptionBuilder {
            config: self.config.clone(),
            client_config: self.client_config.clone(),
            service: self.service.clone(),
        }
    }

    /// The name of the subscription.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The name of the topic this subscription is attached to.
    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// The push delivery configuration. `None` means pull delivery.
    pub fn push_config(&self) -> Option<&PushConfig> {
        self.config.push_config.as_ref()
    }

    /// The ack deadline of the subscription, in seconds.
    pub fn ack_deadline_seconds(&self) -> u32 {
        self.config.ack_deadline_seconds
    }

    /// The configuration snapshot held by this handle.
    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Returns the client used to issue requests.
    ///
    /// After deserialization the client is re-created from the persisted
    /// [ClientConfig] on the first call, which fails if no
    /// [ServiceFactory][crate::client::ServiceFactory] is registered.
    pub fn client(&self) -> Result<&PubSub> {
        match self.service.get() {
            Some(client) => Ok(client),
            None => {
                let client = self.client_config.connect()?;
                Ok(self.service.get_or_init(|| client))
            }
        }
    }

    /// Deletes this subscription.
    ///
    /// Returns `true` if the subscription was deleted, `false` if it was not
    /// found.
    pub async fn delete(&self) -> Result<bool> {
        self.client()?.delete_subscription(self.name()).await
    }

    /// Fetches this subscription's latest configuration.
    ///
    /// Returns a new handle; `self` is unchanged. Returns `None` if the
    /// subscription no longer exists, which callers distinguish from a
    /// failed request.
    pub async fn reload(&self) -> Result<Option<Subscription>> {
        self.client()?.get_subscription(self.name()).await
    }

    /// Replaces the push configuration of this subscription.
    ///
    /// `None` converts the subscription to pull delivery, and a
    /// configuration converts a pull subscription to push delivery. Messages
    /// keep accumulating for delivery regardless of changes to the push
    /// configuration. The handle's own snapshot is unchanged; use
    /// [reload][Subscription::reload] to observe the new configuration.
    pub async fn replace_push_config(&self, push_config: Option<PushConfig>) -> Result<()> {
        self.client()?
            .replace_push_config(self.name(), push_config)
            .await
    }

    /// Pulls up to `max_messages` messages from this subscription.
    ///
    /// May return fewer messages than requested, including none; the service
    /// does not wait for messages to become available. Each returned message
    /// has its ack deadline extended until the application
    /// [acks][LeasedMessage::ack] or [nacks][LeasedMessage::nack] it.
    pub async fn pull(&self, max_messages: u32) -> Result<Vec<LeasedMessage>> {
        let deadline = match self.config.ack_deadline_seconds {
            0 => crate::client::DEFAULT_ACK_DEADLINE_SECONDS,
            n => n,
        };
        self.client()?
            .pull_with_deadline(self.name(), max_messages, deadline)
            .await
    }

    /// Starts a callback-based consumer on this subscription.
    ///
    /// See [PubSub::subscribe] for the consumer semantics.
    pub fn subscribe<P: MessageProcessor>(
        &self,
        processor: P,
        options: PullOptions,
    ) -> Result<MessageConsumer> {
        Ok(self.client()?.subscribe(self.name(), processor, options))
    }

    /// Returns the IAM policy of this subscription.
    ///
    /// Returns `None` if the subscription was not found.
    pub async fn policy(&self) -> Result<Option<Policy>> {
        self.client()?.get_policy(self.name()).await
    }

    /// Replaces the IAM policy of this subscription and returns the new
    /// policy.
    ///
    /// It is recommended to use the read-modify-write pattern: read the
    /// current policy with [policy][Subscription::policy], update it
    /// locally, and write it back. The [etag][Policy::etag] guards against
    /// concurrent updates: if it no longer matches the server's etag this
    /// operation fails with a
    /// [conflict][crate::error::ErrorKind::Conflict] error. An empty etag
    /// overwrites the policy unconditionally.
    pub async fn replace_policy(&self, policy: Policy) -> Result<Policy> {
        self.client()?.replace_policy(self.name(), policy).await
    }

    /// Returns which of `permissions` the caller holds on this subscription.
    ///
    /// The result has one entry per requested permission, in the same order.
    pub async fn test_permissions(&self, permissions: Vec<String>) -> Result<Vec<bool>> {
        self.client()?
            .test_permissions(self.name(), permissions)
            .await
    }
}

/// A builder for [Subscription] handles.
///
/// The builder stages configuration; [build][SubscriptionBuilder::build]
/// copies it into a new immutable handle. Changing the builder afterwards
/// never affects handles already built.
#[derive(Clone, Debug)]
pub struct SubscriptionBuilder {
    config: SubscriptionConfig,
    client_config: ClientConfig,
    service: OnceLock<PubSub>,
}

impl SubscriptionBuilder {
    /// Set the subscription name.
    pub fn set_name<V: Into<String>>(mut self, v: V) -> Self {
        self.config = self.config.set_name(v);
        self
    }

    /// Set the topic the subscription is attached to.
    pub fn set_topic<V: Into<String>>(mut self, v: V) -> Self {
        self.config = self.config.set_topic(v);
        self
    }

    /// Set or clear the push configuration.
    pub fn set_push_config<V: Into<Option<PushConfig>>>(mut self, v: V) -> Self {
        self.config = self.config.set_push_config(v);
        self
    }

    /// Set the ack deadline, in seconds.
    pub fn set_ack_deadline_seconds<V: Into<u32>>(mut self, v: V) -> Self {
        self.config = self.config.set_ack_deadline_seconds(v);
        self
    }

    /// Builds an immutable [Subscription] handle from the staged
    /// configuration.
    pub fn build(&self) -> Subscription {
        Subscription {
            config: self.config.clone(),
            client_config: self.client_config.clone(),
            service: self.service.clone(),
        }
    }
}
