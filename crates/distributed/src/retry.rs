// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restartable view over a worker's reservation log.

use crate::keys::Keyspace;
use redis::aio::ConnectionManager;
use shardq_core::{BuildId, StaticQueue, TestId};

/// An in-memory replay of the tests one worker reserved, in reservation
/// order.
///
/// The queue itself is static: it never requeues and every acknowledge
/// succeeds. The store handle and build keyspace are kept only so the
/// external reporter can keep addressing the build's error reports.
pub struct RetryQueue {
    inner: StaticQueue,
    conn: ConnectionManager,
    keys: Keyspace,
}

impl RetryQueue {
    pub(crate) fn new(tests: Vec<TestId>, conn: ConnectionManager, build_id: BuildId) -> Self {
        Self {
            inner: StaticQueue::new(tests, 0, 0.0),
            conn,
            keys: Keyspace::new(&build_id),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn total(&self) -> usize {
        self.inner.total()
    }

    pub fn progress(&self) -> usize {
        self.inner.progress()
    }

    pub fn next_test(&mut self) -> Option<TestId> {
        self.inner.next_test()
    }

    pub fn acknowledge(&self, test: &TestId) -> bool {
        self.inner.acknowledge(test)
    }

    /// Retry runs never requeue.
    pub fn requeue(&mut self, test: &TestId) -> bool {
        self.inner.requeue(test)
    }

    /// Store handle for collaborators that consume the build namespace.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Key of the error-report mapping for this build.
    pub fn error_reports_key(&self) -> String {
        self.keys.error_reports()
    }
}
