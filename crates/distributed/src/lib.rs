// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shardq-distributed: build coordination over a shared redis-compatible store.
//!
//! A build's workers all point at the same store with the same build id.
//! One wins the master election and seeds the queue; every worker then
//! loops reserving one test at a time, acknowledging successes and
//! requeuing failures, while a supervisor waits for the queue to drain.
//! All cross-process coordination happens inside atomic server-side
//! scripts; process-local state is limited to the election outcome and
//! configuration.

mod base;
pub mod error;
pub mod keys;
pub mod queue;
pub mod retry;
mod scripts;
pub mod supervisor;
pub mod worker;

pub use base::MasterStatus;
pub use error::Error;
pub use keys::Keyspace;
pub use queue::{build_queue, connect, QueueKind, TestQueue};
pub use retry::RetryQueue;
pub use supervisor::Supervisor;
pub use worker::{Worker, WorkerConfig, DEFAULT_REQUEUE_OFFSET};
