// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Open task
//!
//! Runs the open phase, releases the other tasks through the barrier,
//! then sleeps on a signal that is never sent during normal operation.

use crate::setup;
use crate::task::{self, Signal, TaskId};
use core::sync::atomic::{AtomicBool, Ordering};
use fw_common::bits::lower_mask;
use fw_common::log_error;

static TERMINATE: AtomicBool = AtomicBool::new(false);

/// Open task entry
pub fn task_body() {
    // Open time
    if let Err(error) = setup::open() {
        log_error!("open", "setup failed: {}", error);
    }

    if let Err(error) = task::broadcast(Signal::GlobalOpen, TaskId::Open) {
        log_error!("open", "open broadcast failed: {}", error);
    }

    // Accumulate every task's done-bit, masking out our own
    let mut required_sigs = lower_mask(task::num()) & !1;
    while required_sigs != 0 {
        let received = task::wait_any();
        if received == 0 {
            break; // No kernel; nothing to wait on
        }
        required_sigs &= !received;
    }

    if let Err(error) = task::broadcast(Signal::GlobalRun, TaskId::Open) {
        log_error!("open", "run broadcast failed: {}", error);
    }

    // Run time
    loop {
        // Should not wake again
        task::wait_strict(Signal::GlobalInvalid);

        if TERMINATE.load(Ordering::Acquire) {
            break;
        }
    }
}

/// Unit-test accessors
pub mod test_access {
    use super::{Ordering, TERMINATE};

    /// Let the open task exit on its next wake
    pub fn request_terminate() {
        TERMINATE.store(true, Ordering::Release);
    }
}
