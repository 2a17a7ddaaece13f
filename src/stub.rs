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

//! The interface consumed from the underlying service client.
//!
//! Everything in this crate delegates to an implementation of
//! [SubscriptionService]. Transport, authentication, and retry policy all
//! live behind this trait; this crate adds handles and lifecycle management
//! on top of it and nothing else.

use crate::Result;
use crate::model::{Policy, PushConfig, ReceivedMessage, SubscriptionConfig};

/// The operations a subscription handle delegates to.
///
/// Implementations are typically transport stubs. Tests implement this trait
/// with a mock.
#[async_trait::async_trait]
pub trait SubscriptionService: std::fmt::Debug + Send + Sync {
    /// Deletes a subscription.
    ///
    /// Returns `true` if the subscription was deleted, `false` if it was not
    /// found.
    async fn delete_subscription(&self, name: &str) -> Result<bool>;

    /// Fetches the current configuration of a subscription.
    ///
    /// Returns `None` if the subscription was not found.
    async fn get_subscription(&self, name: &str) -> Result<Option<SubscriptionConfig>>;

    /// Replaces the push configuration of a subscription.
    ///
    /// `None` converts the subscription to pull delivery. Messages keep
    /// accumulating for delivery regardless of changes to the push
    /// configuration.
    async fn replace_push_config(&self, name: &str, push_config: Option<PushConfig>)
    -> Result<()>;

    /// Pulls up to `max_messages` messages from a subscription.
    ///
    /// May return fewer messages than requested, including none. The service
    /// does not wait for more messages to become available.
    async fn pull(&self, name: &str, max_messages: u32) -> Result<Vec<ReceivedMessage>>;

    /// Acknowledges a batch of messages.
    async fn acknowledge(&self, name: &str, ack_ids: Vec<String>) -> Result<()>;

    /// Changes the ack deadline of a batch of messages.
    ///
    /// A deadline of `0` makes the messages immediately available for
    /// redelivery (a negative acknowledgement).
    async fn modify_ack_deadline(
        &self,
        name: &str,
        ack_ids: Vec<String>,
        ack_deadline_seconds: u32,
    ) -> Result<()>;

    /// Returns the IAM policy of a subscription.
    ///
    /// Returns `None` if the subscription was not found.
    async fn get_policy(&self, name: &str) -> Result<Option<Policy>>;

    /// Replaces the IAM policy of a subscription and returns the new policy.
    ///
    /// If the supplied policy carries a non-empty etag and it does not match
    /// the etag stored by the service, the operation fails with a
    /// [conflict][crate::error::ErrorKind::Conflict] error. An empty etag
    /// overwrites the policy unconditionally.
    async fn replace_policy(&self, name: &str, policy: Policy) -> Result<Policy>;

    /// Returns which of `permissions` the caller holds on a subscription.
    ///
    /// The result has one entry per requested permission, in the same order.
    async fn test_permissions(&self, name: &str, permissions: Vec<String>) -> Result<Vec<bool>>;
}
