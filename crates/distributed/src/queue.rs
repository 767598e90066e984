// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue polymorphism and URL-driven construction.

use crate::error::Error;
use crate::retry::RetryQueue;
use crate::supervisor::Supervisor;
use crate::worker::{Worker, WorkerConfig};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use shardq_core::{Clock, QueueUrl, RedisConfig, StaticQueue, TestId};

/// Operations every consumable queue offers, whatever its backing.
///
/// Static queues answer from memory and can never fail; the distributed
/// implementations go through the store on every call. The `distributed`
/// marker tells collaborators whether a shared error-report store exists
/// for this queue.
#[async_trait]
pub trait TestQueue {
    fn is_distributed(&self) -> bool;

    async fn len(&mut self) -> Result<usize, Error>;

    async fn progress(&mut self) -> Result<usize, Error>;

    /// The next test to run, or `None` once the queue is done handing
    /// them out.
    async fn next_test(&mut self) -> Result<Option<TestId>, Error>;

    /// `false` reports a late acknowledge: another worker reclaimed the
    /// test first.
    async fn acknowledge(&mut self, test: &TestId) -> Result<bool, Error>;

    /// `false` reports a refusal, not a failure; the caller decides what a
    /// non-requeued failing test means.
    async fn requeue(&mut self, test: &TestId) -> Result<bool, Error>;
}

#[async_trait]
impl TestQueue for StaticQueue {
    fn is_distributed(&self) -> bool {
        false
    }

    async fn len(&mut self) -> Result<usize, Error> {
        Ok(StaticQueue::len(self))
    }

    async fn progress(&mut self) -> Result<usize, Error> {
        Ok(StaticQueue::progress(self))
    }

    async fn next_test(&mut self) -> Result<Option<TestId>, Error> {
        Ok(StaticQueue::next_test(self))
    }

    async fn acknowledge(&mut self, test: &TestId) -> Result<bool, Error> {
        Ok(StaticQueue::acknowledge(self, test))
    }

    async fn requeue(&mut self, test: &TestId) -> Result<bool, Error> {
        Ok(StaticQueue::requeue(self, test))
    }
}

#[async_trait]
impl<C: Clock> TestQueue for Worker<C> {
    fn is_distributed(&self) -> bool {
        true
    }

    async fn len(&mut self) -> Result<usize, Error> {
        Ok(Worker::len(self).await? as usize)
    }

    async fn progress(&mut self) -> Result<usize, Error> {
        Ok(Worker::progress(self).await? as usize)
    }

    async fn next_test(&mut self) -> Result<Option<TestId>, Error> {
        Worker::next_test(self).await
    }

    async fn acknowledge(&mut self, test: &TestId) -> Result<bool, Error> {
        Worker::acknowledge(self, test).await
    }

    async fn requeue(&mut self, test: &TestId) -> Result<bool, Error> {
        Worker::requeue(self, test).await
    }
}

#[async_trait]
impl TestQueue for RetryQueue {
    fn is_distributed(&self) -> bool {
        true
    }

    async fn len(&mut self) -> Result<usize, Error> {
        Ok(RetryQueue::len(self))
    }

    async fn progress(&mut self) -> Result<usize, Error> {
        Ok(RetryQueue::progress(self))
    }

    async fn next_test(&mut self) -> Result<Option<TestId>, Error> {
        Ok(RetryQueue::next_test(self))
    }

    async fn acknowledge(&mut self, test: &TestId) -> Result<bool, Error> {
        Ok(RetryQueue::acknowledge(self, test))
    }

    async fn requeue(&mut self, test: &TestId) -> Result<bool, Error> {
        Ok(RetryQueue::requeue(self, test))
    }
}

/// The queue selected by a queue URL.
pub enum QueueKind {
    Static(StaticQueue),
    Worker(Worker),
    Supervisor(Supervisor),
    Retry(RetryQueue),
}

impl std::fmt::Debug for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            QueueKind::Static(_) => "Static",
            QueueKind::Worker(_) => "Worker",
            QueueKind::Supervisor(_) => "Supervisor",
            QueueKind::Retry(_) => "Retry",
        };
        f.debug_tuple(variant).finish()
    }
}

impl QueueKind {
    /// Whether queue state lives in a shared store.
    pub fn is_distributed(&self) -> bool {
        !matches!(self, QueueKind::Static(_))
    }

    /// The consumable queue, if this kind produces tests (supervisors
    /// don't).
    pub fn queue_mut(&mut self) -> Option<&mut dyn TestQueue> {
        match self {
            QueueKind::Static(queue) => Some(queue),
            QueueKind::Worker(worker) => Some(worker),
            QueueKind::Retry(retry) => Some(retry),
            QueueKind::Supervisor(_) => None,
        }
    }
}

/// Open a store connection for the given config.
///
/// `socket_connect_timeout` bounds connection establishment; per-request
/// behaviour is the connection manager's (it reconnects and retries on the
/// next call after a drop).
pub async fn connect(config: &RedisConfig) -> Result<ConnectionManager, Error> {
    let client = redis::Client::open(config.store_url.as_str())?;
    let conn = match config.socket_connect_timeout {
        Some(limit) => tokio::time::timeout(limit, client.get_connection_manager())
            .await
            .map_err(|_| {
                redis::RedisError::from((
                    redis::ErrorKind::IoError,
                    "timed out connecting to the coordination store",
                ))
            })??,
        None => client.get_connection_manager().await?,
    };
    Ok(conn)
}

/// Build the queue a URL describes. Workers supply the test index;
/// supervisors pass `None`.
pub async fn build_queue(url: &QueueUrl, tests: Option<Vec<TestId>>) -> Result<QueueKind, Error> {
    match url {
        QueueUrl::List(listed) => Ok(QueueKind::Static(StaticQueue::new(listed.clone(), 0, 0.0))),
        QueueUrl::File(path) => Ok(QueueKind::Static(StaticQueue::from_file(path, 0, 0.0)?)),
        QueueUrl::Redis(config) => {
            match tests {
                None => {
                    let conn = connect(config).await?;
                    Ok(QueueKind::Supervisor(Supervisor::new(
                        conn,
                        config.build_id.clone(),
                    )))
                }
                Some(tests) => {
                    let worker_id = config
                        .worker_id
                        .clone()
                        .ok_or(shardq_core::ConfigError::MissingParam("worker"))?;
                    let conn = connect(config).await?;
                    let mut worker = Worker::new(
                        conn,
                        tests,
                        WorkerConfig {
                            build_id: config.build_id.clone(),
                            worker_id,
                            timeout: config.timeout,
                            max_requeues: config.max_requeues,
                            requeue_tolerance: config.requeue_tolerance,
                        },
                    )
                    .await?;
                    if config.retry {
                        Ok(QueueKind::Retry(worker.retry_queue().await?))
                    } else {
                        Ok(QueueKind::Worker(worker))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
