// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Point-to-point queue facade over the installed kernel
//!
//! Passes pointer-sized items to a task. The event bus does not use
//! these; they exist for module-private hand-off between tasks.

use crate::kernel;
use fw_common::Result;

/// Send a pointer-sized item to a task's queue
///
/// # Errors
/// Returns an error when the queue is full.
pub fn send(slot: u32, item: usize) -> Result<()> {
    kernel::get()?.queue_send(slot, item)
}

/// Block until an item arrives on the calling task's queue
#[must_use]
pub fn wait(slot: u32) -> usize {
    match kernel::get() {
        Ok(kernel) => kernel.queue_wait(slot),
        Err(_) => 0,
    }
}
