// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! HAL trait definitions
//!
//! This module defines the platform-agnostic peripheral traits that must
//! be implemented for each target platform. Every method has a no-op
//! default reporting success: a peripheral absent from a platform behaves
//! as specified without the board writing a stub.

use fw_common::Result;

/// Electrical polarity of a GPIO function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    /// Logic 1 asserts the function
    High,
    /// Logic 0 asserts the function
    Low,
}

/// Heap region figures from the platform linker map
#[derive(Debug, Clone, Copy)]
pub struct HeapInfo {
    /// Lowest heap address
    pub base: usize,
    /// One past the highest heap address
    pub end: usize,
    /// High-water mark of allocation
    pub max: usize,
}

/// GPIO interface
pub trait GpioOps: Sync {
    /// Read the logical pin level
    ///
    /// # Errors
    /// Returns an error for a pin the platform does not route.
    fn read(&self, port: u32, pin: u32) -> Result<bool> {
        let _ = (port, pin);
        Ok(false)
    }

    /// Drive the pin to its asserted level
    ///
    /// # Errors
    /// Returns an error for a pin the platform does not route.
    fn set(&self, port: u32, pin: u32, active: ActiveState) -> Result<()> {
        let _ = (port, pin, active);
        Ok(())
    }

    /// Drive the pin to its deasserted level
    ///
    /// # Errors
    /// Returns an error for a pin the platform does not route.
    fn reset(&self, port: u32, pin: u32, active: ActiveState) -> Result<()> {
        let _ = (port, pin, active);
        Ok(())
    }
}

/// ADC interface
///
/// The application converts raw counts to volts as
/// `vref * raw / (2^bits - 1)`.
pub trait AdcOps: Sync {
    /// Power up the converter
    ///
    /// # Errors
    /// Returns an error when the converter fails to initialise.
    fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Read the latest raw conversion for a channel
    ///
    /// # Errors
    /// Returns an error for a channel the platform does not route.
    fn read(&self, port: u32, pin: u32) -> Result<u32> {
        let _ = (port, pin);
        Ok(0)
    }

    /// Conversion width in bits for a channel
    fn bit_width(&self, port: u32, pin: u32) -> u32 {
        let _ = (port, pin);
        12
    }

    /// Reference voltage in volts
    fn reference_voltage(&self) -> f32 {
        3.3
    }

    /// Kick a conversion cycle
    ///
    /// # Errors
    /// Returns an error when the converter rejects the request.
    fn start_conversion(&self) -> Result<()> {
        Ok(())
    }
}

/// UART interface
///
/// Reception is interrupt-driven: the port delivers each received byte to
/// the application's ISR hook, which owns the RX ring.
pub trait UartOps: Sync {
    /// Bring up a port instance
    ///
    /// # Errors
    /// Returns an error when the port fails to initialise.
    fn open(&self, handle: u32) -> Result<()> {
        let _ = handle;
        Ok(())
    }

    /// Transmit a string (blocking)
    ///
    /// # Errors
    /// Returns an error when the port rejects the transfer.
    fn send(&self, handle: u32, text: &str) -> Result<()> {
        let _ = (handle, text);
        Ok(())
    }
}

/// Flash interface over the settings region
///
/// Addresses are byte offsets from the start of the region. Writes can
/// only program bits toward zero; an erase restores a whole sector to
/// 0xFF.
pub trait FlashOps: Sync {
    /// Read bytes
    ///
    /// # Errors
    /// Returns an error for an out-of-region access.
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let _ = addr;
        buf.fill(0xFF);
        Ok(())
    }

    /// Program bytes
    ///
    /// # Errors
    /// Returns an error for an out-of-region access or a program failure.
    fn write(&self, addr: u32, data: &[u8]) -> Result<()> {
        let _ = (addr, data);
        Ok(())
    }

    /// Erase the sector containing `sector_addr`
    ///
    /// # Errors
    /// Returns an error for an out-of-region access or an erase failure.
    fn erase(&self, sector_addr: u32) -> Result<()> {
        let _ = sector_addr;
        Ok(())
    }

    /// Round `value` up to the device's minimum programming granularity
    fn align(&self, value: u32) -> u32 {
        (value + 3) & !3
    }

    /// Size of one erase sector in bytes
    fn sector_size(&self) -> u32 {
        4096
    }
}

/// Memory diagnostics interface
pub trait MemOps: Sync {
    /// Heap region figures
    fn heap_info(&self) -> HeapInfo {
        HeapInfo {
            base: 0,
            end: 0,
            max: 0,
        }
    }

    /// Current stack pointer of the caller
    fn stack_pointer(&self) -> usize {
        0
    }
}

/// Power control interface
pub trait PowerOps: Sync {
    /// Request an unconditional system reset
    ///
    /// On hardware this does not return; the simulated board records the
    /// request and returns so host runs stay observable.
    fn reset(&self) {}
}

/// A platform: one implementation per board/port
pub trait BoardOps: Sync {
    /// GPIO controller
    fn gpio(&self) -> &dyn GpioOps;
    /// ADC controller
    fn adc(&self) -> &dyn AdcOps;
    /// UART controller
    fn uart(&self) -> &dyn UartOps;
    /// Flash controller for the settings region
    fn flash(&self) -> &dyn FlashOps;
    /// Memory diagnostics
    fn mem(&self) -> &dyn MemOps;
    /// Power control
    fn power(&self) -> &dyn PowerOps;
}
