// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker role: seeds the queue when elected master, then reserves,
//! acknowledges, and requeues tests until the build drains.

use crate::base::{Base, MasterStatus};
use crate::error::Error;
use crate::retry::RetryQueue;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use shardq_core::{global_max_requeues, BuildId, Clock, SystemClock, TestId, WorkerId};
use std::time::Duration;

/// Idle delay between failed reservation attempts.
const IDLE_DELAY: Duration = Duration::from_millis(50);

/// How long iteration waits for the master before giving up.
const MASTER_WAIT: Duration = Duration::from_secs(10);

/// Slots left between the consumption point and a requeued test, so a
/// just-failed test does not come straight back to the worker that failed
/// it.
pub const DEFAULT_REQUEUE_OFFSET: u64 = 42;

/// Construction parameters for a [`Worker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub build_id: BuildId,
    pub worker_id: WorkerId,
    /// Reservation staleness threshold; zero disables reclamation of lost
    /// reservations.
    pub timeout: Duration,
    /// Per-test requeue cap.
    pub max_requeues: u32,
    /// Global requeue budget as a fraction of the test count.
    pub requeue_tolerance: f64,
}

/// One worker process's view of a distributed build.
pub struct Worker<C: Clock = SystemClock> {
    base: Base,
    worker_id: WorkerId,
    clock: C,
    timeout: Duration,
    max_requeues: u32,
    global_max_requeues: u64,
    shutdown_requested: bool,
    waited_for_master: bool,
}

impl Worker<SystemClock> {
    /// Join the build, electing a master and seeding the queue if this
    /// worker wins the election.
    pub async fn new(
        conn: ConnectionManager,
        tests: Vec<TestId>,
        config: WorkerConfig,
    ) -> Result<Self, Error> {
        Self::with_clock(conn, tests, config, SystemClock).await
    }
}

impl<C: Clock> Worker<C> {
    pub async fn with_clock(
        conn: ConnectionManager,
        tests: Vec<TestId>,
        config: WorkerConfig,
        clock: C,
    ) -> Result<Self, Error> {
        let mut base = Base::new(conn, config.build_id);
        base.total = Some(tests.len() as u64);

        let mut worker = Self {
            base,
            worker_id: config.worker_id,
            clock,
            timeout: config.timeout,
            max_requeues: config.max_requeues,
            global_max_requeues: global_max_requeues(tests.len(), config.requeue_tolerance),
            shutdown_requested: false,
            waited_for_master: false,
        };

        if let Err(err) = worker.elect_and_seed(&tests).await {
            // A master cannot hand off a half-seeded build. Anyone else
            // re-touches the store on their next operation anyway.
            if worker.base.is_master || !err.is_connection_error() {
                return Err(err);
            }
            tracing::warn!(
                build = %worker.base.build_id,
                worker = %worker.worker_id,
                error = %err,
                "store unreachable during registration, continuing",
            );
        }

        Ok(worker)
    }

    async fn elect_and_seed(&mut self, tests: &[TestId]) -> Result<(), Error> {
        let status_key = self.base.keys.master_status();
        let queue_key = self.base.keys.queue();
        let total_key = self.base.keys.total();
        let workers_key = self.base.keys.workers();

        self.base.is_master = self
            .base
            .conn
            .set_nx(&status_key, MasterStatus::Setup.to_string())
            .await?;

        if self.base.is_master {
            tracing::info!(
                build = %self.base.build_id,
                worker = %self.worker_id,
                tests = tests.len(),
                "elected master, seeding queue",
            );
            let ids: Vec<&str> = tests.iter().map(TestId::as_str).collect();
            let mut pipe = redis::pipe();
            pipe.atomic();
            if !ids.is_empty() {
                // Pushed to the head in list order so that tail pops yield
                // the original order.
                pipe.lpush(&queue_key, ids);
            }
            pipe.set(&total_key, tests.len() as u64);
            pipe.set(&status_key, MasterStatus::Ready.to_string());
            pipe.query_async::<_, ()>(&mut self.base.conn).await?;
        }

        let _: i64 = self
            .base
            .conn
            .sadd(&workers_key, self.worker_id.as_str())
            .await?;
        Ok(())
    }

    pub fn is_master(&self) -> bool {
        self.base.is_master
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    pub fn build_id(&self) -> &BuildId {
        &self.base.build_id
    }

    /// End iteration at the next loop turn. In-flight store calls are not
    /// interrupted.
    pub fn shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// `|queue| + |running|` right now; never cached.
    pub async fn len(&mut self) -> Result<u64, Error> {
        self.base.len().await
    }

    pub async fn total(&mut self) -> Result<u64, Error> {
        self.base.total().await
    }

    pub async fn progress(&mut self) -> Result<u64, Error> {
        self.base.progress().await
    }

    pub async fn wait_for_master(&mut self, timeout: Duration) -> Result<(), Error> {
        self.base.wait_for_master(timeout).await
    }

    /// The next reserved test, or `None` when the build has drained,
    /// `shutdown` was requested, or the store connection dropped.
    ///
    /// Waits for the master to finish seeding on the first call. Prefers
    /// reclaiming a lost reservation over a fresh reserve, and idles
    /// briefly when other workers hold everything that is left.
    pub async fn next_test(&mut self) -> Result<Option<TestId>, Error> {
        match self.poll_next().await {
            Ok(test) => Ok(test),
            Err(err) if err.is_connection_error() => {
                tracing::warn!(
                    build = %self.base.build_id,
                    worker = %self.worker_id,
                    error = %err,
                    "store connection lost, ending iteration",
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn poll_next(&mut self) -> Result<Option<TestId>, Error> {
        if !self.waited_for_master {
            self.base.wait_for_master(MASTER_WAIT).await?;
            self.waited_for_master = true;
        }

        loop {
            if self.shutdown_requested {
                return Ok(None);
            }

            let now = self.clock.unix_seconds();
            if let Some(test) = self.reserve_lost(now).await? {
                tracing::debug!(worker = %self.worker_id, test = %test, "reclaimed lost reservation");
                return Ok(Some(test));
            }
            if let Some(test) = self.reserve(now).await? {
                return Ok(Some(test));
            }

            let queue_key = self.base.keys.queue();
            let queued: u64 = self.base.conn.llen(&queue_key).await?;
            if queued == 0 {
                return Ok(None);
            }
            tokio::time::sleep(IDLE_DELAY).await;
        }
    }

    async fn reserve(&mut self, now: f64) -> Result<Option<TestId>, Error> {
        let Base {
            conn, keys, scripts, ..
        } = &mut self.base;
        let test: Option<String> = scripts
            .reserve
            .key(keys.queue())
            .key(keys.running())
            .key(keys.processed())
            .key(keys.worker_queue(&self.worker_id))
            .arg(now)
            .invoke_async(conn)
            .await?;
        Ok(test.map(TestId::from))
    }

    async fn reserve_lost(&mut self, now: f64) -> Result<Option<TestId>, Error> {
        if self.timeout.is_zero() {
            return Ok(None);
        }
        let Base {
            conn, keys, scripts, ..
        } = &mut self.base;
        let test: Option<String> = scripts
            .reserve_lost
            .key(keys.running())
            .key(keys.completed())
            .key(keys.worker_queue(&self.worker_id))
            .arg(now)
            .arg(self.timeout.as_secs_f64())
            .invoke_async(conn)
            .await?;
        Ok(test.map(TestId::from))
    }

    /// Mark a test done. `true` means this worker still held the
    /// reservation; `false` is a late acknowledge after someone reclaimed
    /// it.
    pub async fn acknowledge(&mut self, test: &TestId) -> Result<bool, Error> {
        let Base {
            conn, keys, scripts, ..
        } = &mut self.base;
        let removed: u64 = scripts
            .acknowledge
            .key(keys.running())
            .key(keys.processed())
            .arg(test.as_str())
            .invoke_async(conn)
            .await?;
        Ok(removed == 1)
    }

    /// Send a failed test back to the queue, [`DEFAULT_REQUEUE_OFFSET`]
    /// slots from the consumption point.
    pub async fn requeue(&mut self, test: &TestId) -> Result<bool, Error> {
        self.requeue_with_offset(test, DEFAULT_REQUEUE_OFFSET).await
    }

    /// `false` when either requeue cap refuses the test.
    pub async fn requeue_with_offset(
        &mut self,
        test: &TestId,
        offset: u64,
    ) -> Result<bool, Error> {
        if self.max_requeues == 0 || self.global_max_requeues == 0 {
            return Ok(false);
        }

        let Base {
            conn, keys, scripts, ..
        } = &mut self.base;
        let accepted: u64 = scripts
            .requeue
            .key(keys.processed())
            .key(keys.requeues_count())
            .key(keys.queue())
            .key(keys.running())
            .arg(self.max_requeues)
            .arg(self.global_max_requeues)
            .arg(test.as_str())
            .arg(offset)
            .invoke_async(conn)
            .await?;
        Ok(accepted == 1)
    }

    /// Materialise this worker's reservation log as a restartable
    /// in-memory queue, oldest reservation first.
    pub async fn retry_queue(&mut self) -> Result<RetryQueue, Error> {
        let log_key = self.base.keys.worker_queue(&self.worker_id);
        let mut tests: Vec<String> = self.base.conn.lrange(&log_key, 0, -1).await?;
        tests.reverse();
        let tests = tests.into_iter().map(TestId::from).collect();
        Ok(RetryQueue::new(
            tests,
            self.base.conn.clone(),
            self.base.build_id.clone(),
        ))
    }
}
