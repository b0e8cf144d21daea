// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for pipeline runs.

use thiserror::Error;

/// A boxed user error, as reported through a [`Canceler`](crate::Canceler).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias using Parafold's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a pipeline run.
///
/// Exactly one of these is returned per failed run: the first error recorded
/// through a [`Canceler`](crate::Canceler) wins over anything reported
/// later.
#[derive(Debug, Error)]
pub enum Error {
    /// The run was cancelled without an explicit error.
    #[error("pipeline cancelled without an error")]
    Cancelled,

    /// The reducer finished without writing a value.
    #[error("reducer did not write a value")]
    NoOutput,

    /// A mapper or reducer panicked; the message is the panic payload.
    #[error("{0}")]
    Panicked(String),

    /// An error reported by user code.
    #[error("{0}")]
    Failed(BoxError),
}

impl Error {
    /// Wraps an arbitrary error as [`Error::Failed`].
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Error::Failed(err.into())
    }
}

impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        Error::Failed(err)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Failed(message.into())
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Failed(message.into())
    }
}
