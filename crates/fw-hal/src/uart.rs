// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! UART facade over the installed board

use crate::board;
use fw_common::Result;

/// Bring up a port instance
///
/// # Errors
/// Propagates board errors.
pub fn open(handle: u32) -> Result<()> {
    board::get()?.uart().open(handle)
}

/// Transmit a string (blocking)
///
/// # Errors
/// Propagates board errors.
pub fn send(handle: u32, text: &str) -> Result<()> {
    board::get()?.uart().send(handle, text)
}
