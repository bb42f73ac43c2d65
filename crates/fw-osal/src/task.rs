// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Task facade over the installed kernel

use crate::kernel::{self, StackInfo, TaskEntry, TaskHandle};
use fw_common::Result;

/// Create a statically backed task
///
/// # Errors
/// Propagates kernel creation failures.
pub fn create_task(
    entry: TaskEntry,
    slot: u32,
    stack_depth: u16,
    priority: u32,
) -> Result<TaskHandle> {
    kernel::get()?.create_task(entry, slot, stack_depth, priority)
}

/// Set notification bits on a task; callable from ISR and task context
///
/// # Errors
/// Propagates kernel signalling failures.
pub fn send_signal(handle: TaskHandle, bits: u32) -> Result<()> {
    kernel::get()?.send_signal(handle, bits)
}

/// Block the calling task until any notification bits are set
///
/// Returns the received bit set and clears it. Calling this without an
/// installed kernel is a contract fault; zero is returned so the caller's
/// loop stays well-defined under the `Propagate` policy.
#[must_use]
pub fn wait_signal() -> u32 {
    match kernel::get() {
        Ok(kernel) => kernel.wait_signal(),
        Err(_) => 0,
    }
}

/// Stack diagnostics for a task slot
///
/// # Errors
/// Propagates kernel lookup failures.
pub fn stack_info(slot: u32) -> Result<StackInfo> {
    Ok(kernel::get()?.stack_info(slot))
}
