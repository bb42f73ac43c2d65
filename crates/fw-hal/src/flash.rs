// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Flash facade over the installed board
//!
//! Addresses are byte offsets from the start of the settings region.

use crate::board;
use fw_common::Result;

/// Read bytes
///
/// # Errors
/// Propagates board errors.
pub fn read(addr: u32, buf: &mut [u8]) -> Result<()> {
    board::get()?.flash().read(addr, buf)
}

/// Program bytes (bits move toward zero only)
///
/// # Errors
/// Propagates board errors.
pub fn write(addr: u32, data: &[u8]) -> Result<()> {
    board::get()?.flash().write(addr, data)
}

/// Erase the sector containing `sector_addr`
///
/// # Errors
/// Propagates board errors.
pub fn erase(sector_addr: u32) -> Result<()> {
    board::get()?.flash().erase(sector_addr)
}

/// Round `value` up to the device programming granularity
///
/// # Errors
/// Propagates board errors.
pub fn align(value: u32) -> Result<u32> {
    Ok(board::get()?.flash().align(value))
}

/// Size of one erase sector in bytes
///
/// # Errors
/// Propagates board errors.
pub fn sector_size() -> Result<u32> {
    Ok(board::get()?.flash().sector_size())
}
