// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Installed board singleton
//!
//! One [`BoardOps`] implementation is installed during start-up; the
//! peripheral facade modules delegate to it.

use crate::traits::BoardOps;
use core::ptr::addr_of;
use fw_common::{contract, Error, Result};

static mut BOARD: Option<&'static dyn BoardOps> = None;

/// Install the active board
///
/// Must be called before any peripheral access, during single-threaded
/// start-up.
pub fn install(board: &'static dyn BoardOps) {
    // SAFETY: Written once during single-threaded start-up, read-only
    // afterwards.
    unsafe {
        BOARD = Some(board);
    }
}

/// Get the installed board
///
/// # Errors
/// Raises a `DeviceNotFound` contract fault when no board is installed.
pub fn get() -> Result<&'static dyn BoardOps> {
    // SAFETY: BOARD is written only during single-threaded start-up.
    let board = unsafe { *addr_of!(BOARD) };
    contract::require(board.is_some(), Error::DeviceNotFound)?;
    board.ok_or(Error::DeviceNotFound)
}
