// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the distributed queue.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The master never reported the queue seeded within the wait budget.
    /// Retrying with a larger timeout is legitimate.
    #[error("master worker is still `{}` after waiting {:.1}s", display_status(last_status), waited.as_secs_f64())]
    LostMaster {
        waited: Duration,
        /// Last `master-status` value observed, if any.
        last_status: Option<String>,
    },

    /// The coordination store rejected or dropped an operation.
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// The queue URL did not describe a usable queue.
    #[error(transparent)]
    Config(#[from] shardq_core::ConfigError),

    /// A file-backed test list could not be read.
    #[error("failed to read test list: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the store client reported a connectivity failure rather
    /// than a protocol or scripting error. Connectivity failures are
    /// survivable for everyone but a seeding master: registration retries
    /// implicitly on the next operation, and an iterating worker just ends
    /// its sequence.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Store(err) => {
                err.is_connection_refusal()
                    || err.is_connection_dropped()
                    || err.is_io_error()
                    || err.is_timeout()
            }
            _ => false,
        }
    }
}

fn display_status(status: &Option<String>) -> &str {
    status.as_deref().unwrap_or("unset")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
