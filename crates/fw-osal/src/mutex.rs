// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Mutex facade over the installed kernel
//!
//! Mutexes are a small fixed registry keyed by [`MutexId`]. Takes use an
//! unbounded wait; the design invariant is that no holder hangs.

use crate::kernel;
use fw_common::Result;

/// Identity of each kernel mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MutexId {
    /// Serialises event queue consumers
    EventHandle = 0,
    /// Guards the periodic callback table
    Periodic = 1,
    /// Guards settings marshalling and the flash backend
    Settings = 2,
}

/// Number of kernel mutexes
pub const NUM_MUTEXES: usize = 3;

/// Blocking take with unbounded timeout
///
/// # Errors
/// Fails only on resource error, never on contention.
pub fn take(id: MutexId) -> Result<()> {
    kernel::get()?.mutex_take(id)
}

/// Release a held mutex
///
/// # Errors
/// Fails only on resource error.
pub fn give(id: MutexId) -> Result<()> {
    kernel::get()?.mutex_give(id)
}
