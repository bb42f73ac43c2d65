// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Power control facade over the installed board

use crate::board;

/// Request an unconditional system reset
///
/// On hardware this does not return. Without an installed board the
/// request is dropped (the fault layer has already recorded the cause).
pub fn reset() {
    if let Ok(board) = board::get() {
        board.power().reset();
    }
}
