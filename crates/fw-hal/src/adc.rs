// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ADC facade over the installed board

use crate::board;
use fw_common::Result;

/// Power up the converter
///
/// # Errors
/// Propagates board errors.
pub fn open() -> Result<()> {
    board::get()?.adc().open()
}

/// Read the latest raw conversion
///
/// # Errors
/// Propagates board errors.
pub fn read(port: u32, pin: u32) -> Result<u32> {
    board::get()?.adc().read(port, pin)
}

/// Conversion width in bits for a channel
///
/// # Errors
/// Propagates board errors.
pub fn bit_width(port: u32, pin: u32) -> Result<u32> {
    Ok(board::get()?.adc().bit_width(port, pin))
}

/// Reference voltage in volts
///
/// # Errors
/// Propagates board errors.
pub fn reference_voltage() -> Result<f32> {
    Ok(board::get()?.adc().reference_voltage())
}

/// Kick a conversion cycle
///
/// # Errors
/// Propagates board errors.
pub fn start_conversion() -> Result<()> {
    board::get()?.adc().start_conversion()
}
