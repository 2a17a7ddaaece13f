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

//! An idiomatic client for Pub/Sub subscription management.
//!
//! The entry points are [PubSub][client::PubSub], a thin facade over a
//! [SubscriptionService][stub::SubscriptionService] transport stub, and
//! [Subscription][subscription::Subscription], an immutable, serializable
//! handle to a single subscription. Handles delegate every operation to
//! the client, keyed by the subscription name: deletion, reloading the
//! server-side configuration, replacing the push configuration, pulling
//! messages, running a callback consumer, and IAM policy management.
//!
//! # Example
//! ```no_run
//! # use pubsub_subscription::client::PubSub;
//! # async fn sample(client: PubSub) -> anyhow::Result<()> {
//! let subscription = client
//!     .get_subscription("projects/my-project/subscriptions/my-subscription")
//!     .await?
//!     .expect("subscription exists");
//! println!("attached to {}", subscription.topic());
//! # Ok(()) }
//! ```

pub mod client;
pub mod error;
pub mod model;
pub mod stub;
pub mod subscriber;
pub mod subscription;

pub use error::{Error, Result};
