// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance specs for the in-memory queue, driven through the shared
//! queue contract.

use crate::prelude::*;
use shardq_core::StaticQueue;
use shardq_distributed::TestQueue;

fn queue() -> StaticQueue {
    StaticQueue::new(test_list(), 1, 0.1)
}

async fn drain(queue: &mut dyn TestQueue) -> Vec<TestId> {
    let mut order = Vec::new();
    while let Some(test) = queue.next_test().await.unwrap() {
        assert!(queue.acknowledge(&test).await.unwrap());
        order.push(test);
    }
    order
}

#[tokio::test]
async fn yields_tests_in_original_order() {
    let mut queue = queue();
    assert_eq!(TestQueue::len(&mut queue).await.unwrap(), TEST_LIST.len());
    assert_eq!(drain(&mut queue).await, test_list());
    assert_eq!(TestQueue::len(&mut queue).await.unwrap(), 0);
}

#[tokio::test]
async fn requeued_test_runs_next() {
    // Per-test cap 1, global budget ceil(4 * 0.1) = 1: exactly one requeue
    // is granted, and a static queue replays it immediately.
    let mut queue = queue();

    let mut order = Vec::new();
    while let Some(test) = TestQueue::next_test(&mut queue).await.unwrap() {
        order.push(test.clone());
        TestQueue::requeue(&mut queue, &test).await.unwrap();
    }

    let mut expected = vec![test_list()[0].clone()];
    expected.extend(test_list());
    assert_eq!(order, expected);
}

#[tokio::test]
async fn progress_tracks_hand_outs() {
    let mut queue = queue();
    let mut expected = 0;
    while let Some(test) = TestQueue::next_test(&mut queue).await.unwrap() {
        expected += 1;
        assert_eq!(TestQueue::progress(&mut queue).await.unwrap(), expected);
        assert!(TestQueue::acknowledge(&mut queue, &test).await.unwrap());
    }
    assert_eq!(expected, TEST_LIST.len());
}
