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

//! Message consumption: leased messages, ack deadline management, and the
//! callback-based consumer.
//!
//! Messages pulled through this crate are *leased*: a background task keeps
//! extending their ack deadline until the application acks or nacks them.
//! Messages dropped without a decision are nacked when the lease shuts down,
//! so the service can redeliver them promptly.

mod consumer;
mod handler;
mod lease;
mod options;
mod processor;

pub use consumer::MessageConsumer;
pub use handler::LeasedMessage;
pub use options::PullOptions;
pub use processor::{BoxError, MessageProcessor};

pub(crate) use lease::pull_leased;
