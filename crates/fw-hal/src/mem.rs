// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Memory diagnostics facade over the installed board

use crate::board;
use crate::traits::HeapInfo;
use fw_common::Result;

/// Heap region figures
///
/// # Errors
/// Propagates board errors.
pub fn heap_info() -> Result<HeapInfo> {
    Ok(board::get()?.mem().heap_info())
}

/// Current stack pointer of the caller
///
/// # Errors
/// Propagates board errors.
pub fn stack_pointer() -> Result<usize> {
    Ok(board::get()?.mem().stack_pointer())
}
