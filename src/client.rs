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

//! The service client facade and its configuration.

use crate::Result;
use crate::error::Error;
use crate::model::{Policy, PushConfig};
use crate::stub::SubscriptionService;
use crate::subscriber::{LeasedMessage, MessageConsumer, MessageProcessor, PullOptions};
use crate::subscription::Subscription;
use std::sync::{Arc, PoisonError, RwLock};

const DEFAULT_HOST: &str = "https://pubsub.googleapis.com";

/// The ack deadline requested when pulling without an explicit deadline.
pub(crate) const DEFAULT_ACK_DEADLINE_SECONDS: u32 = 10;

/// Creates service stubs from a [ClientConfig].
///
/// The transport layer registers a factory with [set_service_factory] at
/// startup. [PubSub::new] and deserialized
/// [Subscription][crate::subscription::Subscription] handles use it to turn
/// persisted configuration back into a live service reference.
pub trait ServiceFactory: Send + Sync + std::fmt::Debug {
    /// Creates a service stub for the given configuration.
    fn create(&self, config: &ClientConfig) -> Result<Arc<dyn SubscriptionService>>;
}

static FACTORY: RwLock<Option<Arc<dyn ServiceFactory>>> = RwLock::new(None);

/// Installs the process-wide [ServiceFactory].
///
/// Typically called once at startup by the transport layer. Replaces any
/// previously installed factory.
pub fn set_service_factory<T: ServiceFactory + 'static>(factory: T) {
    let mut guard = FACTORY.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(Arc::new(factory));
}

fn create_service(config: &ClientConfig) -> Result<Arc<dyn SubscriptionService>> {
    let guard = FACTORY.read().unwrap_or_else(PoisonError::into_inner);
    create_with(guard.as_deref(), config)
}

fn create_with(
    factory: Option<&dyn ServiceFactory>,
    config: &ClientConfig,
) -> Result<Arc<dyn SubscriptionService>> {
    match factory {
        Some(factory) => factory.create(config),
        None => Err(Error::transport("no service factory registered")),
    }
}

/// The persisted configuration of a [PubSub] client.
///
/// Two clients with equal configurations are considered the same service
/// reference for handle equality, regardless of the stub instances behind
/// them. The configuration serializes; the stub does not.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ClientConfig {
    /// The service endpoint.
    pub endpoint: String,

    /// The project whose resources the client operates on.
    pub project_id: String,
}

impl ClientConfig {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [endpoint][ClientConfig::endpoint] field.
    pub fn set_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = v.into();
        self
    }

    /// Set the [project_id][ClientConfig::project_id] field.
    pub fn set_project_id<V: Into<String>>(mut self, v: V) -> Self {
        self.project_id = v.into();
        self
    }

    /// Creates a client for this configuration using the process-wide
    /// [ServiceFactory].
    pub fn connect(&self) -> Result<PubSub> {
        let stub = create_service(self)?;
        Ok(PubSub {
            config: self.clone(),
            inner: stub,
        })
    }
}

impl std::default::Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_HOST.to_string(),
            project_id: String::new(),
        }
    }
}

/// A client for subscription operations.
///
/// The client is a thin facade: every operation is a delegation to the
/// underlying [SubscriptionService] stub, keyed by subscription name. It
/// performs no retries and holds no per-subscription state.
///
/// # Pooling and Cloning
///
/// `PubSub` holds its stub in an `Arc` internally. You do not need to wrap it
/// in an [Rc](std::rc::Rc) or [Arc] to reuse it.
///
/// # Equality
///
/// Two clients compare equal when their [configurations][ClientConfig] are
/// equal. The stub instance never participates in comparisons.
#[derive(Clone, Debug)]
pub struct PubSub {
    config: ClientConfig,
    inner: Arc<dyn SubscriptionService>,
}

impl PartialEq for PubSub {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl PubSub {
    /// Creates a client using the process-wide [ServiceFactory].
    ///
    /// ```no_run
    /// # tokio_test::block_on(async {
    /// # use pubsub_subscription::client::{ClientConfig, PubSub};
    /// let client = PubSub::new(ClientConfig::new().set_project_id("my-project"))?;
    /// let deleted = client
    ///     .delete_subscription("projects/my-project/subscriptions/my-subscription")
    ///     .await?;
    /// # pubsub_subscription::Result::<()>::Ok(()) });
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.connect()
    }

    /// Creates a client from an existing stub.
    ///
    /// Useful for testing with a mock, or for in-process service
    /// implementations.
    pub fn from_stub<T>(config: ClientConfig, stub: T) -> Self
    where
        T: SubscriptionService + 'static,
    {
        Self {
            config,
            inner: Arc::new(stub),
        }
    }

    /// Returns the configuration of this client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn service(&self) -> &Arc<dyn SubscriptionService> {
        &self.inner
    }

    /// Returns a builder for [Subscription] handles bound to this client.
    ///
    /// Building a handle makes no service calls; the subscription may or may
    /// not exist on the server.
    pub fn subscription(&self) -> crate::subscription::SubscriptionBuilder {
        Subscription::builder(self)
    }

    /// Deletes a subscription.
    ///
    /// Returns `true` if the subscription was deleted, `false` if it was not
    /// found.
    pub async fn delete_subscription(&self, name: &str) -> Result<bool> {
        self.inner.delete_subscription(name).await
    }

    /// Fetches a subscription and returns a handle wrapping its latest
    /// configuration.
    ///
    /// Returns `None` if the subscription was not found.
    pub async fn get_subscription(&self, name: &str) -> Result<Option<Subscription>> {
        let config = self.inner.get_subscription(name).await?;
        Ok(config.map(|c| Subscription::from_config(self, c)))
    }

    /// Replaces the push configuration of a subscription.
    ///
    /// `None` converts the subscription to pull delivery, and a configuration
    /// converts a pull subscription to push delivery. Messages keep
    /// accumulating for delivery regardless of changes to the push
    /// configuration.
    pub async fn replace_push_config(
        &self,
        name: &str,
        push_config: Option<PushConfig>,
    ) -> Result<()> {
        self.inner.replace_push_config(name, push_config).await
    }

    /// Pulls up to `max_messages` messages from a subscription.
    ///
    /// May return fewer messages than requested, including none; the service
    /// does not wait for messages to become available. `max_messages == 0`
    /// returns an empty batch without a service call.
    ///
    /// Each returned message is under lease management: its ack deadline is
    /// extended until the application [acks][LeasedMessage::ack] or
    /// [nacks][LeasedMessage::nack] it.
    pub async fn pull(&self, name: &str, max_messages: u32) -> Result<Vec<LeasedMessage>> {
        self.pull_with_deadline(name, max_messages, DEFAULT_ACK_DEADLINE_SECONDS)
            .await
    }

    pub(crate) async fn pull_with_deadline(
        &self,
        name: &str,
        max_messages: u32,
        ack_deadline_seconds: u32,
    ) -> Result<Vec<LeasedMessage>> {
        crate::subscriber::pull_leased(&self.inner, name, max_messages, ack_deadline_seconds).await
    }

    /// Starts a callback-based consumer on a subscription.
    ///
    /// The consumer pulls messages and runs `processor` on each one until
    /// [closed][MessageConsumer::close]. A callback returning `Ok`
    /// acknowledges its message; a callback returning an error nacks it.
    pub fn subscribe<P: MessageProcessor>(
        &self,
        name: &str,
        processor: P,
        options: PullOptions,
    ) -> MessageConsumer {
        MessageConsumer::start(
            self.inner.clone(),
            name.to_string(),
            Arc::new(processor),
            options,
        )
    }

    /// Returns the IAM policy of a subscription.
    ///
    /// Returns `None` if the subscription was not found.
    pub async fn get_policy(&self, name: &str) -> Result<Option<Policy>> {
        self.inner.get_policy(name).await
    }

    /// Replaces the IAM policy of a subscription and returns the new policy.
    ///
    /// If `policy` carries a non-empty etag that no longer matches the etag
    /// stored by the service, the operation fails with a
    /// [conflict][crate::error::ErrorKind::Conflict] error. An empty etag
    /// overwrites the policy unconditionally.
    pub async fn replace_policy(&self, name: &str, policy: Policy) -> Result<Policy> {
        self.inner.replace_policy(name, policy).await
    }

    /// Returns which of `permissions` the caller holds on a subscription.
    ///
    /// The result has one entry per requested permission, in the same order.
    pub async fn test_permissions(
        &self,
        name: &str,
        permissions: Vec<String>,
    ) -> Result<Vec<bool>> {
        self.inner.test_permissions(name, permissions).await
    }
}
