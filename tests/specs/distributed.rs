// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for the distributed queue against a live coordination store.
//!
//! Every spec coordinates under a build id unique to the test process, so
//! a shared store (or leftover state from an aborted run) cannot bleed
//! between runs.

use crate::prelude::*;
use shardq_core::{BuildId, WorkerId};
use shardq_distributed::{Error, Keyspace, Supervisor, Worker, WorkerConfig};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn store_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/7".to_string())
}

async fn connect() -> redis::aio::ConnectionManager {
    let client = redis::Client::open(store_url()).unwrap();
    client.get_connection_manager().await.unwrap()
}

fn unique_build_id(name: &str) -> BuildId {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    BuildId::new(format!("{name}-{}-{n}", std::process::id()))
}

async fn spawn_worker(build_id: &BuildId, worker_id: &str) -> Worker {
    Worker::new(
        connect().await,
        test_list(),
        WorkerConfig {
            build_id: build_id.clone(),
            worker_id: WorkerId::from(worker_id),
            timeout: Duration::from_millis(200),
            max_requeues: 1,
            requeue_tolerance: 0.1,
        },
    )
    .await
    .unwrap()
}

/// Drain the queue, acknowledging every test, and return the hand-out order.
async fn work_off(worker: &mut Worker) -> Vec<TestId> {
    let mut order = Vec::new();
    while let Some(test) = worker.next_test().await.unwrap() {
        assert!(worker.acknowledge(&test).await.unwrap());
        order.push(test);
    }
    order
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn yields_tests_in_original_order() {
    let build_id = unique_build_id("order");
    let mut worker = spawn_worker(&build_id, "w1").await;

    assert_eq!(worker.len().await.unwrap(), 4);
    assert_eq!(work_off(&mut worker).await, test_list());
    assert_eq!(worker.len().await.unwrap(), 0);
    assert_eq!(worker.progress().await.unwrap(), 4);

    // Everything the build started with is in the processed set.
    let mut conn = connect().await;
    let processed: HashSet<String> = redis::cmd("SMEMBERS")
        .arg(Keyspace::new(&build_id).processed())
        .query_async(&mut conn)
        .await
        .unwrap();
    let expected: HashSet<String> = TEST_LIST.iter().map(|s| s.to_string()).collect();
    assert_eq!(processed, expected);
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn requeued_test_comes_back_at_the_end() {
    let build_id = unique_build_id("requeue");
    let mut worker = spawn_worker(&build_id, "w1").await;

    let mut order = Vec::new();
    while let Some(test) = worker.next_test().await.unwrap() {
        order.push(test.clone());
        worker.requeue(&test).await.unwrap();
    }

    // The offset is longer than the queue, so the one granted requeue goes
    // to the head and is handed out last.
    let mut expected = test_list();
    expected.push(test_list()[0].clone());
    assert_eq!(order, expected);

    let mut conn = connect().await;
    let counts: Vec<(String, u32)> = redis::cmd("HGETALL")
        .arg(Keyspace::new(&build_id).requeues_count())
        .query_async(&mut conn)
        .await
        .unwrap();
    assert_eq!(counts, vec![(TEST_LIST[0].to_string(), 1)]);
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn shutdown_ends_iteration_after_the_current_test() {
    let build_id = unique_build_id("shutdown");
    let mut worker = spawn_worker(&build_id, "w1").await;

    let mut count = 0;
    while let Some(_test) = worker.next_test().await.unwrap() {
        count += 1;
        worker.shutdown();
    }

    assert_eq!(count, 1);
    assert!(worker.len().await.unwrap() >= 3);
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn first_worker_wins_the_master_election() {
    let build_id = unique_build_id("election");
    let first = spawn_worker(&build_id, "w1").await;
    let second = spawn_worker(&build_id, "w2").await;

    assert!(first.is_master());
    assert!(!second.is_master());
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn supervisor_gives_up_without_a_master() {
    let build_id = unique_build_id("lost-master");
    let mut supervisor = Supervisor::new(connect().await, build_id.clone());

    let err = supervisor.wait_for_master(Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, Error::LostMaster { .. }));

    // Once any worker has seeded the build, the same call succeeds.
    let _worker = spawn_worker(&build_id, "w1").await;
    supervisor.wait_for_master(Duration::ZERO).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn supervisor_waits_for_drain() {
    let build_id = unique_build_id("drain");
    let mut worker = spawn_worker(&build_id, "w1").await;
    work_off(&mut worker).await;

    let mut supervisor = Supervisor::new(connect().await, build_id);
    supervisor
        .wait_for_workers(Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(supervisor.progress().await.unwrap(), 4);
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn retry_queue_replays_the_reservation_order() {
    let build_id = unique_build_id("retry");
    let mut worker = spawn_worker(&build_id, "w1").await;
    let original_order = work_off(&mut worker).await;

    let mut retry = worker.retry_queue().await.unwrap();
    assert_eq!(retry.len(), original_order.len());

    let mut replayed = Vec::new();
    while let Some(test) = retry.next_test() {
        assert!(retry.acknowledge(&test));
        replayed.push(test);
    }
    assert_eq!(replayed, original_order);
}

#[tokio::test]
#[ignore = "needs a running redis; set REDIS_URL and pass --ignored"]
async fn reclaimed_test_turns_the_original_acknowledge_late() {
    let build_id = unique_build_id("reclaim");
    let mut first = spawn_worker(&build_id, "w1").await;
    let mut second = spawn_worker(&build_id, "w2").await;

    let test = first.next_test().await.unwrap().unwrap();
    // Let the reservation go stale past the 200 ms staleness threshold.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let reclaimed = second.next_test().await.unwrap().unwrap();
    assert_eq!(reclaimed, test);

    assert!(second.acknowledge(&reclaimed).await.unwrap());
    // The original holder lost the race; its acknowledge reports late.
    assert!(!first.acknowledge(&test).await.unwrap());
}
