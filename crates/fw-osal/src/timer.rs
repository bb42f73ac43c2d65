// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Software timer facade over the installed kernel

use crate::kernel::{self, TimerCallback};
use fw_common::Result;

/// Identity of each software timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TimerId {
    /// The single 1 ms tick driving the periodic scheduler
    Periodic = 0,
}

/// Number of software timers
pub const NUM_TIMERS: usize = 1;

/// Create a millisecond software timer
///
/// # Errors
/// Returns an error when the id is already created with a different
/// configuration.
pub fn create(id: TimerId, callback: TimerCallback, period_ms: u32, repeat: bool) -> Result<()> {
    kernel::get()?.timer_create(id, callback, period_ms, repeat)
}

/// Start a created timer (idempotent)
///
/// # Errors
/// Returns an error for a timer that was never created.
pub fn start(id: TimerId) -> Result<()> {
    kernel::get()?.timer_start(id)
}

/// Stop a running timer
///
/// # Errors
/// Returns an error for a timer that was never created.
pub fn stop(id: TimerId) -> Result<()> {
    kernel::get()?.timer_stop(id)
}

/// Check whether a timer is currently running
#[must_use]
pub fn is_running(id: TimerId) -> bool {
    match kernel::get() {
        Ok(kernel) => kernel.timer_is_running(id),
        Err(_) => false,
    }
}

/// Monotonic millisecond tick
#[must_use]
pub fn curr_time_ms() -> u32 {
    match kernel::get() {
        Ok(kernel) => kernel.now_ms(),
        Err(_) => 0,
    }
}
