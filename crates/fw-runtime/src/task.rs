// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Task runtime
//!
//! The task set is finite and known at build time. Tasks communicate
//! through bitwise notification signals; the open-phase barrier uses one
//! dedicated done-bit per task (bit index = task ordinal) addressed to
//! the distinguished open task.

use crate::task_control;
use crate::task_open;
use core::fmt::Write;
use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{AtomicBool, Ordering};
use fw_common::{contract, Error, Result};
use fw_osal::kernel::{TaskEntry, TaskHandle};

/// Task identity; ordinals index the signal done-bits
///
/// The open task must stay at ordinal zero: the barrier masks its own
/// done-bit out as `!1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskId {
    /// Runs the open phase, then sleeps
    Open = 0,
    /// Drains events into the controls framework
    Control = 1,
}

/// Number of tasks
pub const NUM_TASKS: usize = 2;

impl TaskId {
    /// Ordinal of this task
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Task from its ordinal
    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Open),
            1 => Some(Self::Control),
            _ => None,
        }
    }
}

/// Notification signal bits, universally defined across tasks
///
/// The low bits double as open-phase done-bits when addressed to the
/// open task, which interprets every incoming bit as a done-bit and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Signal {
    /// Start open-phase work
    GlobalOpen = fw_common::bits::BIT_0,
    /// Start run-phase work
    GlobalRun = fw_common::bits::BIT_1,
    /// A queued event awaits
    GlobalEvent = fw_common::bits::BIT_2,
    /// Graceful exit request (test use)
    GlobalTerminate = fw_common::bits::BIT_3,
    /// Never sent during normal operation; parks the open task
    GlobalInvalid = fw_common::bits::BIT_4,
}

impl Signal {
    /// Bit value of this signal
    #[must_use]
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Task priority ordinals handed to the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskPriority {
    /// Lowest priority
    Lowest = 0,
    /// Low priority
    Low = 1,
    /// Medium priority
    Medium = 2,
    /// High priority
    High = 3,
    /// Highest priority
    Highest = 4,
}

struct TaskDesc {
    id: TaskId,
    name: &'static str,
    priority: TaskPriority,
    stack_depth: u16,
    entry: TaskEntry,
}

const TASK_TABLE: [TaskDesc; NUM_TASKS] = [
    TaskDesc {
        id: TaskId::Open,
        name: "open",
        priority: TaskPriority::Medium,
        stack_depth: 512,
        entry: task_open::task_body,
    },
    TaskDesc {
        id: TaskId::Control,
        name: "control",
        priority: TaskPriority::Medium,
        stack_depth: 1024,
        entry: task_control::task_body,
    },
];

#[derive(Clone, Copy)]
struct TaskState {
    handle: Option<TaskHandle>,
    open_signal: u32,
}

static mut TASK_STATE: [TaskState; NUM_TASKS] = [TaskState {
    handle: None,
    open_signal: 0,
}; NUM_TASKS];

static INITED: AtomicBool = AtomicBool::new(false);

fn state(id: TaskId) -> TaskState {
    // SAFETY: TASK_STATE is written only by init() during single-threaded
    // start-up; afterwards it is read-only.
    unsafe { (*addr_of!(TASK_STATE))[id.index()] }
}

/// Number of tasks
#[must_use]
pub const fn num() -> u32 {
    NUM_TASKS as u32
}

/// Create every task through the kernel; callable exactly once
///
/// # Errors
/// Raises a `TooManyAttempts` contract fault on re-initialisation and
/// propagates kernel creation failures.
pub fn init() -> Result<()> {
    contract::require(!INITED.load(Ordering::Acquire), Error::TooManyAttempts)?;

    for (i, desc) in TASK_TABLE.iter().enumerate() {
        let handle = fw_osal::task::create_task(
            desc.entry,
            desc.id as u32,
            desc.stack_depth,
            desc.priority as u32,
        );
        contract::ensure(handle.is_ok(), Error::DeviceInitFailed)?;

        // SAFETY: init() is single-threaded start-up code guarded by
        // INITED; no task exists for a slot until its entry is written.
        unsafe {
            (*addr_of_mut!(TASK_STATE))[i] = TaskState {
                handle: handle.ok(),
                open_signal: 1 << i,
            };
        }
    }

    INITED.store(true, Ordering::Release);
    Ok(())
}

/// Send the caller's open done-bit to the open task
///
/// # Errors
/// Propagates kernel signalling failures.
pub fn send_open_signal(caller: TaskId) -> Result<()> {
    let done_bit = state(caller).open_signal;
    if let Some(open_handle) = state(TaskId::Open).handle {
        fw_osal::task::send_signal(open_handle, done_bit)?;
    }
    Ok(())
}

/// Send a signal to another task
///
/// A task that has not been created yet is skipped; its queue contents
/// survive and are drained on its first wake.
///
/// # Errors
/// Propagates kernel signalling failures.
pub fn send_signal(task_id: TaskId, signal: Signal) -> Result<()> {
    if let Some(handle) = state(task_id).handle {
        fw_osal::task::send_signal(handle, signal.bits())?;
    }
    Ok(())
}

/// Fan a signal out to every task except the caller
///
/// # Errors
/// Propagates kernel signalling failures.
pub fn broadcast(signal: Signal, caller: TaskId) -> Result<()> {
    for desc in &TASK_TABLE {
        if desc.id != caller {
            send_signal(desc.id, signal)?;
        }
    }
    Ok(())
}

/// Block until the wanted signal bit is observed
///
/// Other bits received while waiting are discarded, which is the open
/// protocol's contract: strict waits are only used for the barrier
/// signals.
pub fn wait_strict(signal: Signal) {
    let wanted = signal.bits();
    let mut received = fw_osal::task::wait_signal();
    while received & wanted == 0 {
        if received == 0 {
            // No kernel installed; do not spin forever
            return;
        }
        received = fw_osal::task::wait_signal();
    }
}

/// Block until any signal arrives; returns the raw bit set
#[must_use]
pub fn wait_any() -> u32 {
    fw_osal::task::wait_signal()
}

/// Render per-task stack usage into `out`; `dump` appends the painted region
///
/// # Errors
/// Propagates kernel diagnostic failures.
pub fn write_stack_usage(out: &mut dyn Write, dump: bool) -> Result<()> {
    for desc in &TASK_TABLE {
        let info = fw_osal::task::stack_info(desc.id as u32)?;

        let _ = writeln!(out, "Task {} ({}) Stack Usage:\r", desc.id as u32, desc.name);
        let _ = writeln!(out, "Stack Base           (addr): 0x{:08X}\r", info.base);
        let _ = writeln!(
            out,
            "Stack End            (addr): 0x{:08X}\r",
            info.base + info.size as usize
        );
        let _ = writeln!(out, "Stack Size          (bytes): {}\r", info.size);
        let _ = writeln!(out, "Stack Maximum Usage (bytes): {}\r", info.high_water);
        let _ = writeln!(out, "\r");

        if dump {
            // The painted region itself is not addressable through the
            // kernel seam on every port; report the watermark window.
            let _ = writeln!(
                out,
                "Stack Dump: {} of {} bytes painted\r",
                info.size - info.high_water,
                info.size
            );
        }
    }
    Ok(())
}

/// Unit-test accessors
pub mod test_access {
    use super::{addr_of_mut, TaskId, TaskState, TASK_STATE};
    use fw_osal::kernel::TaskHandle;

    /// Point a task at an arbitrary kernel handle
    pub fn set_handle(id: TaskId, handle: Option<TaskHandle>) {
        // SAFETY: Test-only override, serialised by the test harness.
        unsafe {
            (*addr_of_mut!(TASK_STATE))[id.index()] = TaskState {
                handle,
                open_signal: 1 << id.index(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_are_distinct_bits() {
        let all = [
            Signal::GlobalOpen,
            Signal::GlobalRun,
            Signal::GlobalEvent,
            Signal::GlobalTerminate,
            Signal::GlobalInvalid,
        ];
        let mut seen = 0u32;
        for s in all {
            assert_eq!(seen & s.bits(), 0);
            seen |= s.bits();
        }
    }

    #[test]
    fn open_task_is_ordinal_zero() {
        assert_eq!(TaskId::Open.index(), 0);
        assert_eq!(TASK_TABLE[0].id, TaskId::Open);
        assert_eq!(TaskId::from_index(1), Some(TaskId::Control));
        assert_eq!(TaskId::from_index(9), None);
    }
}
