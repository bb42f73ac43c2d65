// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! GPIO facade over the installed board

use crate::board;
use crate::traits::ActiveState;
use fw_common::Result;

/// Read the logical pin level
///
/// # Errors
/// Propagates board errors.
pub fn read(port: u32, pin: u32) -> Result<bool> {
    board::get()?.gpio().read(port, pin)
}

/// Drive the pin to its asserted level
///
/// # Errors
/// Propagates board errors.
pub fn set(port: u32, pin: u32, active: ActiveState) -> Result<()> {
    board::get()?.gpio().set(port, pin, active)
}

/// Drive the pin to its deasserted level
///
/// # Errors
/// Propagates board errors.
pub fn reset(port: u32, pin: u32, active: ActiveState) -> Result<()> {
    board::get()?.gpio().reset(port, pin, active)
}
