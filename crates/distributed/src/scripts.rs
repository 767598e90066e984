// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic server-side scripts.
//!
//! Every cross-worker mutation of the queue happens inside one of these
//! four scripts, each a single critical section on the store.
//! [`redis::Script`] caches the SHA per process and re-registers on
//! NOSCRIPT, so a flushed script cache heals on the next call.

use redis::Script;

pub(crate) struct ScriptSet {
    /// Claim the next unprocessed test from the queue tail.
    pub(crate) reserve: Script,
    /// Reclaim a reservation whose holder went silent.
    pub(crate) reserve_lost: Script,
    /// Mark a test done; idempotent.
    pub(crate) acknowledge: Script,
    /// Send a failed test back toward the queue tail, subject to caps.
    pub(crate) requeue: Script,
}

impl ScriptSet {
    pub(crate) fn new() -> Self {
        Self {
            reserve: Script::new(include_str!("lua/reserve.lua")),
            reserve_lost: Script::new(include_str!("lua/reserve_lost.lua")),
            acknowledge: Script::new(include_str!("lua/acknowledge.lua")),
            requeue: Script::new(include_str!("lua/requeue.lua")),
        }
    }
}

#[cfg(test)]
#[path = "scripts_tests.rs"]
mod tests;
