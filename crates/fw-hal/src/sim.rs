// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Simulated board
//!
//! Implements every peripheral in RAM for host runs and tests. The flash
//! model follows NOR semantics: an erase restores a sector to 0xFF and a
//! program can only move bits toward zero, which is what the settings
//! backend's tombstoning relies on. Erase and write failures can be
//! injected to exercise the sector-rotation paths.

use crate::traits::{
    ActiveState, AdcOps, BoardOps, FlashOps, GpioOps, HeapInfo, MemOps, PowerOps, UartOps,
};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use fw_common::{Error, Result};
use std::string::String;
use std::sync::{Mutex, OnceLock};
use std::vec::Vec;

/// Number of GPIO ports
pub const GPIO_PORTS: usize = 4;
/// Pins per GPIO port
pub const GPIO_PINS: usize = 16;
/// ADC channels per port
pub const ADC_CHANNELS: usize = 16;
/// Simulated flash sector size in bytes
pub const SECTOR_SIZE: u32 = 4096;
/// Number of simulated flash sectors
pub const NUM_SECTORS: u32 = 2;
/// Simulated UART port instances
pub const UART_PORTS: usize = 2;

const FLASH_SIZE: usize = (SECTOR_SIZE * NUM_SECTORS) as usize;

/// The simulated board
pub struct SimBoard {
    pins: Mutex<[[bool; GPIO_PINS]; GPIO_PORTS]>,
    adc_raw: Mutex<[u32; ADC_CHANNELS]>,
    uart_tx: [Mutex<String>; UART_PORTS],
    flash: Mutex<[u8; FLASH_SIZE]>,
    erase_fail: Mutex<[bool; NUM_SECTORS as usize]>,
    write_fail_budget: AtomicU32,
    reset_requested: AtomicBool,
}

impl SimBoard {
    fn new() -> Self {
        Self {
            pins: Mutex::new([[false; GPIO_PINS]; GPIO_PORTS]),
            adc_raw: Mutex::new([0; ADC_CHANNELS]),
            uart_tx: core::array::from_fn(|_| Mutex::new(String::new())),
            flash: Mutex::new([0xFF; FLASH_SIZE]),
            erase_fail: Mutex::new([false; NUM_SECTORS as usize]),
            write_fail_budget: AtomicU32::new(0),
            reset_requested: AtomicBool::new(false),
        }
    }

    /// Set a pin level directly (simulating the external world)
    pub fn drive_pin(&self, port: u32, pin: u32, level: bool) {
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(p) = pins
            .get_mut(port as usize)
            .and_then(|p| p.get_mut(pin as usize))
        {
            *p = level;
        }
    }

    /// Set an ADC channel's raw conversion value
    pub fn set_adc_raw(&self, pin: u32, raw: u32) {
        let mut channels = self.adc_raw.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(c) = channels.get_mut(pin as usize) {
            *c = raw;
        }
    }

    /// Drain everything transmitted on a UART port
    pub fn take_uart_output(&self, handle: u32) -> String {
        let mut tx = self.uart_tx[handle as usize % UART_PORTS]
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        core::mem::take(&mut *tx)
    }

    /// Mark a flash sector as failing every erase
    pub fn set_erase_fail(&self, sector: u32, fail: bool) {
        let mut sectors = self.erase_fail.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = sectors.get_mut(sector as usize) {
            *s = fail;
        }
    }

    /// Fail the next `count` flash writes
    pub fn fail_next_writes(&self, count: u32) {
        self.write_fail_budget.store(count, Ordering::SeqCst);
    }

    /// Fill the whole flash region with 0xFF
    pub fn wipe_flash(&self) {
        let mut flash = self.flash.lock().unwrap_or_else(|e| e.into_inner());
        flash.fill(0xFF);
    }

    /// Copy out the whole flash region (test inspection)
    pub fn snapshot_flash(&self) -> Vec<u8> {
        let flash = self.flash.lock().unwrap_or_else(|e| e.into_inner());
        flash.to_vec()
    }

    /// Check and clear the recorded reset request
    pub fn take_reset_requested(&self) -> bool {
        self.reset_requested.swap(false, Ordering::SeqCst)
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        let end = addr as usize + len;
        if end > FLASH_SIZE {
            return Err(Error::InvalidLength);
        }
        Ok(())
    }
}

impl GpioOps for SimBoard {
    fn read(&self, port: u32, pin: u32) -> Result<bool> {
        let pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        pins.get(port as usize)
            .and_then(|p| p.get(pin as usize))
            .copied()
            .ok_or(Error::InvalidPin)
    }

    fn set(&self, port: u32, pin: u32, active: ActiveState) -> Result<()> {
        let level = matches!(active, ActiveState::High);
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        let p = pins
            .get_mut(port as usize)
            .and_then(|p| p.get_mut(pin as usize))
            .ok_or(Error::InvalidPin)?;
        *p = level;
        Ok(())
    }

    fn reset(&self, port: u32, pin: u32, active: ActiveState) -> Result<()> {
        let level = matches!(active, ActiveState::Low);
        let mut pins = self.pins.lock().unwrap_or_else(|e| e.into_inner());
        let p = pins
            .get_mut(port as usize)
            .and_then(|p| p.get_mut(pin as usize))
            .ok_or(Error::InvalidPin)?;
        *p = level;
        Ok(())
    }
}

impl AdcOps for SimBoard {
    fn read(&self, _port: u32, pin: u32) -> Result<u32> {
        let channels = self.adc_raw.lock().unwrap_or_else(|e| e.into_inner());
        channels.get(pin as usize).copied().ok_or(Error::InvalidPin)
    }
}

impl UartOps for SimBoard {
    fn send(&self, handle: u32, text: &str) -> Result<()> {
        let mut tx = self.uart_tx[handle as usize % UART_PORTS]
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        tx.push_str(text);
        Ok(())
    }
}

impl FlashOps for SimBoard {
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        let flash = self.flash.lock().unwrap_or_else(|e| e.into_inner());
        buf.copy_from_slice(&flash[addr as usize..addr as usize + buf.len()]);
        Ok(())
    }

    fn write(&self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;

        let budget = self.write_fail_budget.load(Ordering::SeqCst);
        if budget > 0 {
            self.write_fail_budget.store(budget - 1, Ordering::SeqCst);
            return Err(Error::WriteFailed);
        }

        let mut flash = self.flash.lock().unwrap_or_else(|e| e.into_inner());
        for (offset, byte) in data.iter().enumerate() {
            // NOR: programming clears bits, never sets them
            flash[addr as usize + offset] &= byte;
        }
        Ok(())
    }

    fn erase(&self, sector_addr: u32) -> Result<()> {
        self.check_range(sector_addr, 1)?;
        let sector = sector_addr / SECTOR_SIZE;

        {
            let sectors = self.erase_fail.lock().unwrap_or_else(|e| e.into_inner());
            if sectors[sector as usize] {
                return Err(Error::EraseFailed);
            }
        }

        let start = (sector * SECTOR_SIZE) as usize;
        let mut flash = self.flash.lock().unwrap_or_else(|e| e.into_inner());
        flash[start..start + SECTOR_SIZE as usize].fill(0xFF);
        Ok(())
    }

    fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }
}

impl MemOps for SimBoard {
    fn heap_info(&self) -> HeapInfo {
        HeapInfo {
            base: 0x2001_0000,
            end: 0x2001_8000,
            max: 0x2001_2000,
        }
    }

    fn stack_pointer(&self) -> usize {
        let probe = 0u8;
        core::ptr::addr_of!(probe) as usize
    }
}

impl PowerOps for SimBoard {
    fn reset(&self) {
        self.reset_requested.store(true, Ordering::SeqCst);
    }
}

impl BoardOps for SimBoard {
    fn gpio(&self) -> &dyn GpioOps {
        self
    }
    fn adc(&self) -> &dyn AdcOps {
        self
    }
    fn uart(&self) -> &dyn UartOps {
        self
    }
    fn flash(&self) -> &dyn FlashOps {
        self
    }
    fn mem(&self) -> &dyn MemOps {
        self
    }
    fn power(&self) -> &dyn PowerOps {
        self
    }
}

static SIM: OnceLock<SimBoard> = OnceLock::new();

/// Get the process-wide simulated board
pub fn instance() -> &'static SimBoard {
    SIM.get_or_init(SimBoard::new)
}

/// Install the simulated board as the active board (idempotent)
pub fn init() -> &'static SimBoard {
    let board = instance();
    crate::board::install(board);
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nor_write_clears_bits_only() {
        let board = SimBoard::new();
        FlashOps::write(&board, 0, &[0xF0]).unwrap();
        FlashOps::write(&board, 0, &[0x0F]).unwrap();

        let mut byte = [0u8; 1];
        FlashOps::read(&board, 0, &mut byte).unwrap();
        assert_eq!(byte[0], 0x00);
    }

    #[test]
    fn erase_restores_a_sector() {
        let board = SimBoard::new();
        FlashOps::write(&board, 10, &[0x00; 4]).unwrap();
        FlashOps::write(&board, SECTOR_SIZE, &[0x00; 4]).unwrap();
        FlashOps::erase(&board, 0).unwrap();

        let mut byte = [0u8; 1];
        FlashOps::read(&board, 10, &mut byte).unwrap();
        assert_eq!(byte[0], 0xFF);
        FlashOps::read(&board, SECTOR_SIZE, &mut byte).unwrap();
        assert_eq!(byte[0], 0x00);
    }

    #[test]
    fn out_of_region_access_is_rejected() {
        let board = SimBoard::new();
        let mut buf = [0u8; 8];
        assert!(FlashOps::read(&board, SECTOR_SIZE * NUM_SECTORS - 4, &mut buf).is_err());
        assert!(FlashOps::write(&board, SECTOR_SIZE * NUM_SECTORS, &[0]).is_err());
    }

    #[test]
    fn injected_failures_fire_once_per_write() {
        let board = SimBoard::new();
        board.fail_next_writes(1);
        assert_eq!(FlashOps::write(&board, 0, &[0x00]), Err(Error::WriteFailed));
        assert_eq!(FlashOps::write(&board, 0, &[0x00]), Ok(()));
    }

    #[test]
    fn gpio_active_low_polarity() {
        let board = SimBoard::new();
        GpioOps::set(&board, 0, 3, ActiveState::Low).unwrap();
        assert!(!GpioOps::read(&board, 0, 3).unwrap());
        GpioOps::reset(&board, 0, 3, ActiveState::Low).unwrap();
        assert!(GpioOps::read(&board, 0, 3).unwrap());
    }
}
