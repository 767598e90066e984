// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the queue specs.

pub use shardq_core::TestId;

pub const TEST_LIST: [&str; 4] = [
    "ATest#test_foo",
    "ATest#test_bar",
    "BTest#test_foo",
    "BTest#test_bar",
];

pub fn test_list() -> Vec<TestId> {
    TEST_LIST.iter().map(|s| TestId::from(*s)).collect()
}
