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

//! The error type returned by all operations in this crate.
//!
//! Every delegated operation either succeeds or fails with a single uniform
//! [Error]. The crate performs no retries and no local recovery; all failures
//! propagate to the caller, carrying the underlying cause as their `source()`.

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error returned by all the operations in this crate.
#[derive(thiserror::Error, Debug)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new [Error] with the given [ErrorKind] and source error.
    pub fn new<T: Into<BoxError>>(kind: ErrorKind, source: T) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// A helper to create a new [ErrorKind::Transport] error.
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Transport, source)
    }

    /// A helper to create a new [ErrorKind::Authentication] error.
    pub fn authentication<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Authentication, source)
    }

    /// A helper to create a new [ErrorKind::Service] error.
    pub fn service<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Service, source)
    }

    /// A helper to create a new [ErrorKind::Conflict] error.
    ///
    /// The service returns this error when a policy update carries an etag
    /// that no longer matches the etag stored on the server.
    pub fn conflict<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Conflict, source)
    }

    /// A helper to create a new [ErrorKind::Deser] error.
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Deser, source)
    }

    /// A helper to create a new [ErrorKind::Other] error.
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Other, source)
    }

    /// Returns the [ErrorKind] associated with this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind.clone()
    }

    /// Returns true if the error represents an optimistic concurrency failure.
    ///
    /// Applications using the read-modify-write pattern for policy updates
    /// check this to decide whether to re-read the policy and try again.
    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }

    /// Recurses through the source error chain and returns some reference to
    /// the inner value if it is of type `T`, or `None` if it isn't found.
    pub fn as_inner<T: std::error::Error + Send + Sync + 'static>(&self) -> Option<&T> {
        let mut error = self.source.as_deref()? as &(dyn std::error::Error);
        loop {
            match error.downcast_ref::<T>() {
                Some(e) => return Some(e),
                None => error = error.source()?,
            }
        }
    }
}

/// The type of error held by an [Error] instance.
#[derive(thiserror::Error, Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Could not reach the service, or the connection dropped mid-operation.
    #[error("a problem occurred in the transport layer")]
    Transport,
    /// The request could not be authenticated.
    #[error("a problem occurred during authentication")]
    Authentication,
    /// The service rejected or failed the request.
    #[error("the service failed the request")]
    Service,
    /// A policy update was aborted because its etag was stale.
    #[error("the policy etag did not match, the server aborted the update")]
    Conflict,
    /// The response could not be deserialized.
    #[error("a problem occurred while deserializing the response")]
    Deser,
    /// An uncategorized error.
    #[default]
    #[error("a problem occurred")]
    Other,
}
