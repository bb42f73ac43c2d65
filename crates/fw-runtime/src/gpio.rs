// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! GPIO IO elements
//!
//! A pin is readable and writable through the same element; the carried
//! element type is `Bool` in both directions. Writes respect the pin's
//! configured active state.

use crate::input::Input;
use crate::io::{ElemType, IoData, IoFamily, IoId, IoMeta};
use crate::output::Output;
use fw_common::{contract, Error, Result};
use fw_hal::ActiveState;

/// A GPIO pin element
pub struct GpioIo {
    meta: IoMeta,
    port: u32,
    pin: u32,
    active: ActiveState,
}

impl GpioIo {
    const fn new(id: IoId, name: &'static str, port: u32, pin: u32, active: ActiveState) -> Self {
        Self {
            meta: IoMeta::new(id, name, IoFamily::Gpio),
            port,
            pin,
            active,
        }
    }

    fn init_once(&self) -> Result<()> {
        if !self.meta.enter_init() {
            return Ok(());
        }

        self.meta.init_input_info(ElemType::Bool);
        self.meta.init_output_info(ElemType::Bool);
        Ok(())
    }
}

impl Input for GpioIo {
    fn meta(&self) -> &IoMeta {
        &self.meta
    }

    fn produce(&self) -> Result<IoData<'_>> {
        let level = fw_hal::gpio::read(self.port, self.pin)?;
        Ok(IoData::Bool(level))
    }

    fn init(&self) -> Result<()> {
        self.init_once()
    }
}

impl Output for GpioIo {
    fn meta(&self) -> &IoMeta {
        &self.meta
    }

    fn consume(&self, data: &IoData<'_>) -> Result<()> {
        let IoData::Bool(level) = data else {
            contract::invariant(false, Error::InvalidType)?;
            return Ok(());
        };

        if *level {
            fw_hal::gpio::set(self.port, self.pin, self.active)
        } else {
            fw_hal::gpio::reset(self.port, self.pin, self.active)
        }
    }

    fn init(&self) -> Result<()> {
        self.init_once()
    }
}

/// Status LED, active high on port 0 pin 5
pub static LED_STATUS: GpioIo = GpioIo::new(IoId::LedStatus, "led-status", 0, 5, ActiveState::High);

/// User button, active low on port 0 pin 13
pub static BUTTON_USER: GpioIo = GpioIo::new(IoId::ButtonUser, "button-user", 0, 13, ActiveState::Low);
