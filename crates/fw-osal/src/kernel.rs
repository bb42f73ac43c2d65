// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Kernel interface
//!
//! The contract table the application layer is written against. One
//! implementation is installed at start-up, before any task is created;
//! every other module in this crate is a thin facade over the installed
//! implementation.

use crate::mutex::MutexId;
use crate::timer::TimerId;
use core::ptr::addr_of;
use fw_common::{contract, Error, Result};

/// Task entry function
pub type TaskEntry = fn();

/// Timer callback, invoked with the current millisecond clock
pub type TimerCallback = fn(u32);

/// Opaque kernel task handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(pub usize);

/// Stack diagnostics for one task
///
/// The stack is painted with a watermark pattern before the task first
/// runs; `high_water` is the deepest painted byte ever overwritten.
#[derive(Debug, Clone, Copy)]
pub struct StackInfo {
    /// Lowest address of the stack region
    pub base: usize,
    /// Stack size in bytes
    pub size: u32,
    /// Maximum observed usage in bytes
    pub high_water: u32,
}

/// Kernel operations expected from a port
pub trait KernelOps: Sync {
    /// Create a statically backed task with a pre-painted stack
    ///
    /// # Errors
    /// Returns an error when the slot is already in use or the port is
    /// out of task storage.
    fn create_task(
        &self,
        entry: TaskEntry,
        slot: u32,
        stack_depth: u16,
        priority: u32,
    ) -> Result<TaskHandle>;

    /// Set bits on a task's notification word; callable from ISR and task
    ///
    /// # Errors
    /// Returns an error for a handle that names no live task.
    fn send_signal(&self, handle: TaskHandle, bits: u32) -> Result<()>;

    /// Block the calling task until any bits are set; returns and clears them
    fn wait_signal(&self) -> u32;

    /// Blocking mutex take with unbounded timeout
    ///
    /// # Errors
    /// Fails only on resource error, never on contention.
    fn mutex_take(&self, id: MutexId) -> Result<()>;

    /// Release a mutex taken by the calling task
    ///
    /// # Errors
    /// Fails only on resource error.
    fn mutex_give(&self, id: MutexId) -> Result<()>;

    /// Pass a pointer-sized item to a task's queue
    ///
    /// # Errors
    /// Returns an error when the queue is full.
    fn queue_send(&self, slot: u32, item: usize) -> Result<()>;

    /// Block until an item arrives on the calling task's queue
    fn queue_wait(&self, slot: u32) -> usize;

    /// Create a millisecond software timer
    ///
    /// # Errors
    /// Returns an error when the timer id is already created with a
    /// different configuration.
    fn timer_create(
        &self,
        id: TimerId,
        callback: TimerCallback,
        period_ms: u32,
        repeat: bool,
    ) -> Result<()>;

    /// Start a created timer (idempotent)
    ///
    /// # Errors
    /// Returns an error for a timer that was never created.
    fn timer_start(&self, id: TimerId) -> Result<()>;

    /// Stop a running timer
    ///
    /// # Errors
    /// Returns an error for a timer that was never created.
    fn timer_stop(&self, id: TimerId) -> Result<()>;

    /// Check whether a timer is running
    fn timer_is_running(&self, id: TimerId) -> bool;

    /// Monotonic millisecond tick
    fn now_ms(&self) -> u32;

    /// Stack diagnostics for the given task slot
    fn stack_info(&self, slot: u32) -> StackInfo;
}

static mut KERNEL: Option<&'static dyn KernelOps> = None;

/// Install the kernel implementation
///
/// Must be called exactly once, before tasks are created.
pub fn install(ops: &'static dyn KernelOps) {
    // SAFETY: Written once during single-threaded start-up, before any
    // task exists; read-only afterwards.
    unsafe {
        KERNEL = Some(ops);
    }
}

/// Get the installed kernel
///
/// # Errors
/// Raises a `DeviceNotFound` contract fault when no kernel is installed.
pub fn get() -> Result<&'static dyn KernelOps> {
    // SAFETY: KERNEL is written only during single-threaded start-up.
    let kernel = unsafe { *addr_of!(KERNEL) };
    contract::require(kernel.is_some(), Error::DeviceNotFound)?;
    kernel.ok_or(Error::DeviceNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy_comparable() {
        let a = TaskHandle(3);
        let b = TaskHandle(3);
        assert_eq!(a, b);
        assert_ne!(a, TaskHandle(4));
    }
}
