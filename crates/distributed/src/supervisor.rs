// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor role: observes a build without producing or consuming.

use crate::base::{Base, POLL_INTERVAL};
use crate::error::Error;
use redis::aio::ConnectionManager;
use shardq_core::BuildId;
use std::time::Duration;

/// A non-producing observer of one build.
///
/// Supervisors never seed and never reserve; they exist to block until the
/// queue drains so a surrounding pipeline can fan back in.
pub struct Supervisor {
    base: Base,
}

impl Supervisor {
    pub fn new(conn: ConnectionManager, build_id: BuildId) -> Self {
        Self {
            base: Base::new(conn, build_id),
        }
    }

    pub fn build_id(&self) -> &BuildId {
        &self.base.build_id
    }

    /// `|queue| + |running|` right now.
    pub async fn len(&mut self) -> Result<u64, Error> {
        self.base.len().await
    }

    /// Initial test-set size, read from the store (the supervisor never
    /// sees the test list itself).
    pub async fn total(&mut self) -> Result<u64, Error> {
        self.base.total().await
    }

    pub async fn progress(&mut self) -> Result<u64, Error> {
        self.base.progress().await
    }

    pub async fn wait_for_master(&mut self, timeout: Duration) -> Result<(), Error> {
        self.base.wait_for_master(timeout).await
    }

    /// Wait for the master to seed the queue, then for every reservation
    /// to be acknowledged or abandoned.
    pub async fn wait_for_workers(&mut self, master_timeout: Duration) -> Result<(), Error> {
        self.base.wait_for_master(master_timeout).await?;

        while self.base.len().await? != 0 {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Ok(())
    }
}
