// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for reservation timestamps.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock reporting Unix time in seconds.
///
/// Reservation scores in the coordination store are IEEE-754 doubles of
/// seconds since the epoch, so that is the unit exposed here.
pub trait Clock: Clone + Send + Sync {
    fn unix_seconds(&self) -> f64;
}

/// Real system clock
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    seconds: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            seconds: Arc::new(Mutex::new(1_000_000.0)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *self.seconds.lock() += duration.as_secs_f64();
    }

    /// Set the clock to a specific point in time
    pub fn set(&self, seconds: f64) {
        *self.seconds.lock() = seconds;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn unix_seconds(&self) -> f64 {
        *self.seconds.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
