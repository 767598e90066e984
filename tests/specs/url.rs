// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for URL-driven queue construction.

use crate::prelude::*;
use shardq_core::{ConfigError, QueueUrl};
use shardq_distributed::{build_queue, Error, QueueKind};
use std::io::Write as _;

#[tokio::test]
async fn list_url_yields_the_listed_tests() {
    let url = QueueUrl::parse("list:ATest#test_foo:ATest#test_bar").unwrap();
    let mut kind = build_queue(&url, None).await.unwrap();
    assert!(!kind.is_distributed());

    let queue = kind.queue_mut().unwrap();
    let mut order = Vec::new();
    while let Some(test) = queue.next_test().await.unwrap() {
        order.push(test);
    }
    assert_eq!(
        order,
        vec![TestId::from("ATest#test_foo"), TestId::from("ATest#test_bar")]
    );
}

#[tokio::test]
async fn file_url_reads_the_test_list() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for test in TEST_LIST {
        writeln!(file, "{test}").unwrap();
    }
    file.flush().unwrap();

    let url = QueueUrl::parse(&format!("file:{}", file.path().display())).unwrap();
    let mut kind = build_queue(&url, None).await.unwrap();
    let queue = kind.queue_mut().unwrap();
    assert_eq!(queue.len().await.unwrap(), TEST_LIST.len());
}

#[tokio::test]
async fn worker_url_without_worker_id_is_rejected() {
    // Rejected before any store connection is attempted.
    let url = QueueUrl::parse("redis://127.0.0.1:1/0?build=42").unwrap();
    let err = build_queue(&url, Some(test_list())).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingParam("worker"))
    ));
}

#[test]
fn supervisor_urls_do_not_need_a_worker_id() {
    let url = QueueUrl::parse("redis://localhost/0?build=42").unwrap();
    let QueueUrl::Redis(config) = url else {
        panic!("expected a redis config");
    };
    assert_eq!(config.worker_id, None);
}

#[tokio::test]
async fn list_urls_build_static_queues() {
    let url = QueueUrl::parse("list:a:b").unwrap();
    let kind = build_queue(&url, None).await.unwrap();
    assert!(matches!(kind, QueueKind::Static(_)));
}
