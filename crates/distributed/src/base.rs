// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared by every distributed role.

use crate::error::Error;
use crate::keys::Keyspace;
use crate::scripts::ScriptSet;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use shardq_core::BuildId;
use std::time::Duration;

/// How often `master-status` and the queue length are polled.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Master seeding state, stored under `master-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStatus {
    /// Election won, queue not seeded yet.
    Setup,
    /// Queue seeded; workers may start reserving.
    Ready,
    /// Build reported complete (informational).
    Finished,
}

shardq_core::simple_display! {
    MasterStatus {
        Setup => "setup",
        Ready => "ready",
        Finished => "finished",
    }
}

impl MasterStatus {
    pub(crate) fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "setup" => Some(Self::Setup),
            "ready" => Some(Self::Ready),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }

    fn is_seeded(raw: &str) -> bool {
        matches!(Self::from_raw(raw), Some(Self::Ready | Self::Finished))
    }
}

/// Store handle, build keyspace, and the cached election outcome.
///
/// Everything else is deliberately left in the store: queue length and the
/// processed set are re-queried on every use, never cached.
pub(crate) struct Base {
    pub(crate) conn: ConnectionManager,
    pub(crate) build_id: BuildId,
    pub(crate) keys: Keyspace,
    pub(crate) scripts: ScriptSet,
    pub(crate) is_master: bool,
    /// Initial test-set size; `None` until known (observers read it from
    /// the store on demand).
    pub(crate) total: Option<u64>,
}

impl Base {
    pub(crate) fn new(conn: ConnectionManager, build_id: BuildId) -> Self {
        let keys = Keyspace::new(&build_id);
        Self {
            conn,
            build_id,
            keys,
            scripts: ScriptSet::new(),
            is_master: false,
            total: None,
        }
    }

    /// `|queue| + |running|`, fetched in one atomic pipeline.
    pub(crate) async fn len(&mut self) -> Result<u64, Error> {
        let (queued, running): (u64, u64) = redis::pipe()
            .atomic()
            .llen(self.keys.queue())
            .zcard(self.keys.running())
            .query_async(&mut self.conn)
            .await?;
        Ok(queued + running)
    }

    /// Size of the initial test set. Workers know it locally; observers
    /// fall back to the `total` key written by the master.
    pub(crate) async fn total(&mut self) -> Result<u64, Error> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let stored: Option<u64> = self.conn.get(self.keys.total()).await?;
        Ok(stored.unwrap_or(0))
    }

    pub(crate) async fn progress(&mut self) -> Result<u64, Error> {
        let total = self.total().await?;
        let len = self.len().await?;
        Ok(total.saturating_sub(len))
    }

    pub(crate) async fn master_status(&mut self) -> Result<Option<String>, Error> {
        let raw: Option<String> = self.conn.get(self.keys.master_status()).await?;
        Ok(raw)
    }

    /// Block until the master reports the queue seeded.
    ///
    /// Polls every 100 ms, `timeout * 10 + 1` rounds in total, so a zero
    /// timeout still checks once.
    pub(crate) async fn wait_for_master(&mut self, timeout: Duration) -> Result<(), Error> {
        if self.is_master {
            return Ok(());
        }

        let rounds = timeout.as_millis() / POLL_INTERVAL.as_millis() + 1;
        let mut last_status = None;
        for round in 0..rounds {
            last_status = self.master_status().await?;
            if last_status.as_deref().is_some_and(MasterStatus::is_seeded) {
                return Ok(());
            }
            if round + 1 < rounds {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        Err(Error::LostMaster {
            waited: timeout,
            last_status,
        })
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
