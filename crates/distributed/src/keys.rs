// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key derivation for the per-build store namespace.

use shardq_core::{BuildId, WorkerId};

/// Builds keys under `build:<build_id>:…`.
///
/// Segments are joined with `:` and used verbatim; identifiers containing
/// `:` produce ambiguous keys and are the caller's problem.
#[derive(Debug, Clone)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    pub fn new(build_id: &BuildId) -> Self {
        Self {
            prefix: format!("build:{build_id}"),
        }
    }

    pub fn key(&self, parts: &[&str]) -> String {
        let mut key = self.prefix.clone();
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    /// Master election scalar: `setup` → `ready` → `finished`.
    pub fn master_status(&self) -> String {
        self.key(&["master-status"])
    }

    /// Pending tests, seeded at the head and consumed from the tail.
    pub fn queue(&self) -> String {
        self.key(&["queue"])
    }

    /// Live reservations, scored by Unix seconds.
    pub fn running(&self) -> String {
        self.key(&["running"])
    }

    /// Tests acknowledged at least once.
    pub fn processed(&self) -> String {
        self.key(&["processed"])
    }

    /// Tests whose acknowledgement raced a lost-reservation reclaim.
    pub fn completed(&self) -> String {
        self.key(&["completed"])
    }

    /// Per-test requeue counters.
    pub fn requeues_count(&self) -> String {
        self.key(&["requeues-count"])
    }

    /// Registered worker ids.
    pub fn workers(&self) -> String {
        self.key(&["workers"])
    }

    /// Size of the initial test set, written once by the master.
    pub fn total(&self) -> String {
        self.key(&["total"])
    }

    /// One worker's reservation log, newest first.
    pub fn worker_queue(&self, worker_id: &WorkerId) -> String {
        self.key(&["worker", worker_id.as_str(), "queue"])
    }

    /// Error-report mapping maintained by the external reporter; the queue
    /// itself never reads or writes it.
    pub fn error_reports(&self) -> String {
        self.key(&["error-reports"])
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
