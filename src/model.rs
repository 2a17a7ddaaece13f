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

//! Data types used by the subscription handles and the service trait.
//!
//! These are plain value types. They carry no service reference and can be
//! freely serialized, compared, and sent across threads.

use serde_with::serde_as;
use std::collections::HashMap;

/// The configuration of a subscription, as stored by the service.
///
/// This is the snapshot returned by
/// [get_subscription][crate::stub::SubscriptionService::get_subscription]. A
/// [Subscription][crate::subscription::Subscription] handle wraps one of these
/// together with a service client.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct SubscriptionConfig {
    /// The name of the subscription. This is the identity key for all
    /// operations on the resource, e.g.
    /// `projects/my-project/subscriptions/my-subscription`.
    pub name: String,

    /// The name of the topic this subscription is attached to, e.g.
    /// `projects/my-project/topics/my-topic`.
    pub topic: String,

    /// The push delivery configuration. `None` means messages are delivered
    /// by pull.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_config: Option<PushConfig>,

    /// How long the service waits for an acknowledgement before redelivering
    /// a message, in seconds.
    pub ack_deadline_seconds: u32,
}

impl SubscriptionConfig {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [name][SubscriptionConfig::name] field.
    pub fn set_name<V: Into<String>>(mut self, v: V) -> Self {
        self.name = v.into();
        self
    }

    /// Set the [topic][SubscriptionConfig::topic] field.
    pub fn set_topic<V: Into<String>>(mut self, v: V) -> Self {
        self.topic = v.into();
        self
    }

    /// Set or clear the [push_config][SubscriptionConfig::push_config] field.
    pub fn set_push_config<V: Into<Option<PushConfig>>>(mut self, v: V) -> Self {
        self.push_config = v.into();
        self
    }

    /// Set the [ack_deadline_seconds][SubscriptionConfig::ack_deadline_seconds]
    /// field.
    pub fn set_ack_deadline_seconds<V: Into<u32>>(mut self, v: V) -> Self {
        self.ack_deadline_seconds = v.into();
        self
    }
}

/// The configuration of a push subscription endpoint.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct PushConfig {
    /// The URL of the endpoint the service pushes messages to, e.g.
    /// `https://example.com/push`.
    pub push_endpoint: String,

    /// Endpoint configuration attributes, e.g. the API version to use when
    /// formatting push requests.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl PushConfig {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shorthand to create a push configuration for an endpoint URL.
    pub fn of<V: Into<String>>(push_endpoint: V) -> Self {
        Self::new().set_push_endpoint(push_endpoint)
    }

    /// Set the [push_endpoint][PushConfig::push_endpoint] field.
    pub fn set_push_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.push_endpoint = v.into();
        self
    }

    /// Set the [attributes][PushConfig::attributes] field.
    pub fn set_attributes<K, V, I>(mut self, v: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.attributes = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }
}

/// A message published to a topic and delivered on a subscription.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct PubsubMessage {
    /// The identifier assigned by the service when the message was published.
    /// Unique within the topic.
    pub message_id: String,

    /// The message payload.
    #[serde_as(as = "serde_with::base64::Base64")]
    pub data: bytes::Bytes,

    /// Application-defined attributes.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl PubsubMessage {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [message_id][PubsubMessage::message_id] field.
    pub fn set_message_id<V: Into<String>>(mut self, v: V) -> Self {
        self.message_id = v.into();
        self
    }

    /// Set the [data][PubsubMessage::data] field.
    pub fn set_data<V: Into<bytes::Bytes>>(mut self, v: V) -> Self {
        self.data = v.into();
        self
    }

    /// Set the [attributes][PubsubMessage::attributes] field.
    pub fn set_attributes<K, V, I>(mut self, v: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.attributes = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }
}

/// A message as returned by a pull operation: the payload plus the ack id
/// used to acknowledge it or to change its ack deadline.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ReceivedMessage {
    /// The token used to acknowledge this delivery of the message.
    pub ack_id: String,

    /// The message itself.
    pub message: PubsubMessage,
}

impl ReceivedMessage {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [ack_id][ReceivedMessage::ack_id] field.
    pub fn set_ack_id<V: Into<String>>(mut self, v: V) -> Self {
        self.ack_id = v.into();
        self
    }

    /// Set the [message][ReceivedMessage::message] field.
    pub fn set_message<V: Into<PubsubMessage>>(mut self, v: V) -> Self {
        self.message = v.into();
        self
    }
}

/// An Identity and Access Management (IAM) policy.
///
/// A policy is a collection of [Binding]s, attaching sets of members to
/// roles. Use the read-modify-write pattern to update a policy: read the
/// current policy, change the bindings locally, then write it back with
/// [replace_policy][crate::subscription::Subscription::replace_policy]. The
/// [etag][Policy::etag] guards against concurrent modification: a replace
/// with a stale etag fails with a conflict error, while a replace with an
/// empty etag overwrites the policy unconditionally.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Policy {
    /// The bindings between roles and members.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    /// The optimistic concurrency token. Empty means "overwrite blindly".
    #[serde(skip_serializing_if = "String::is_empty")]
    pub etag: String,

    /// The format version of the policy.
    pub version: i32,
}

impl Policy {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [bindings][Policy::bindings] field.
    pub fn set_bindings<V, I>(mut self, v: I) -> Self
    where
        V: Into<Binding>,
        I: IntoIterator<Item = V>,
    {
        self.bindings = v.into_iter().map(|b| b.into()).collect();
        self
    }

    /// Append a binding to the [bindings][Policy::bindings] field.
    pub fn add_binding<V: Into<Binding>>(mut self, v: V) -> Self {
        self.bindings.push(v.into());
        self
    }

    /// Set the [etag][Policy::etag] field.
    pub fn set_etag<V: Into<String>>(mut self, v: V) -> Self {
        self.etag = v.into();
        self
    }

    /// Set the [version][Policy::version] field.
    pub fn set_version<V: Into<i32>>(mut self, v: V) -> Self {
        self.version = v.into();
        self
    }
}

/// Associates a list of members with a role.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Binding {
    /// The role granted to the members, e.g. `roles/pubsub.subscriber`.
    pub role: String,

    /// The identities the role is granted to, e.g. `user:alice@example.com`
    /// or `allAuthenticatedUsers`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl Binding {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [role][Binding::role] field.
    pub fn set_role<V: Into<String>>(mut self, v: V) -> Self {
        self.role = v.into();
        self
    }

    /// Set the [members][Binding::members] field.
    pub fn set_members<V, I>(mut self, v: I) -> Self
    where
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        self.members = v.into_iter().map(|m| m.into()).collect();
        self
    }
}
