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

/// Options for a callback-based message consumer.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PullOptions {
    /// The maximum number of messages either being processed or waiting to
    /// be processed. The consumer stops pulling while this many callbacks
    /// are queued.
    pub max_queued_callbacks: usize,

    /// The ack deadline requested for pulled messages, in seconds. The lease
    /// task extends deadlines at half this interval while a callback runs.
    pub ack_deadline_seconds: u32,
}

impl PullOptions {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [max_queued_callbacks][PullOptions::max_queued_callbacks]
    /// field.
    ///
    /// # Example
    /// ```
    /// # use pubsub_subscription::subscriber::PullOptions;
    /// let options = PullOptions::new().set_max_queued_callbacks(16_usize);
    /// ```
    pub fn set_max_queued_callbacks<V: Into<usize>>(mut self, v: V) -> Self {
        self.max_queued_callbacks = v.into().max(1);
        self
    }

    /// Set the [ack_deadline_seconds][PullOptions::ack_deadline_seconds]
    /// field.
    ///
    /// The minimum deadline you can specify is 10 seconds. The maximum
    /// deadline you can specify is 600 seconds (10 minutes).
    ///
    /// # Example
    /// ```
    /// # use pubsub_subscription::subscriber::PullOptions;
    /// let options = PullOptions::new().set_ack_deadline_seconds(20_u32);
    /// ```
    pub fn set_ack_deadline_seconds<V: Into<u32>>(mut self, v: V) -> Self {
        self.ack_deadline_seconds = v.into();
        self
    }
}

impl std::default::Default for PullOptions {
    fn default() -> Self {
        Self {
            max_queued_callbacks: 100,
            ack_deadline_seconds: 10,
        }
    }
}
