// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Event tracer control
//!
//! Prints each event flowing through the dispatcher to the console,
//! with the owning queue's occupancy. Disabled by default; the
//! `TraceMask` setting narrows the output to the event ids whose bit is
//! set (zero traces everything). Never claims the event, so tracing does
//! not starve the control that owns it.

use crate::control::{Control, HandleStatus};
use crate::event::{self, Event};
use crate::output;
use crate::settings::{ParamValue, SettingId};
use crate::uart;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use fw_common::{Error, Result};
use heapless::String;

/// The event tracer
pub struct EventPrintControl {
    enabled: AtomicBool,
    trace_mask: AtomicU32,
}

impl EventPrintControl {
    const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            trace_mask: AtomicU32::new(0),
        }
    }

    fn traced(&self, event: &Event) -> bool {
        let mask = self.trace_mask.load(Ordering::Relaxed);
        mask == 0 || mask & (1 << (event.id as u32)) != 0
    }
}

impl Control for EventPrintControl {
    fn name(&self) -> &'static str {
        "event-print"
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn init_control(&self) -> Result<()> {
        Ok(())
    }

    fn handle_event(&self, event: &Event) -> Result<HandleStatus> {
        if !self.traced(event) {
            return Ok(HandleStatus::NotHandled);
        }

        let info = event::get_queue_info(event::get_associated_task(event.id));

        let mut line: String<128> = String::new();
        let _ = write!(
            line,
            "evt id:{}, arg:0x{:X}, task:{}, size:{}\r\n",
            event.id as u32,
            event.arg,
            event.task as u32,
            info.rear_pos.wrapping_sub(info.front_pos).wrapping_add(1),
        );

        output::set(&uart::CONSOLE, &line.as_str())?;

        Ok(HandleStatus::NotHandled)
    }

    fn get_param(&self, id: SettingId) -> Result<ParamValue> {
        match id {
            SettingId::TraceMask => Ok(ParamValue::Uint(self.trace_mask.load(Ordering::Relaxed))),
            _ => Err(Error::UnknownType),
        }
    }

    fn set_param(&self, id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
        let _ = bootup;

        match (id, value) {
            (SettingId::TraceMask, ParamValue::Uint(mask)) => {
                self.trace_mask.store(*mask, Ordering::Relaxed);
                Ok(())
            }
            _ => Err(Error::UnknownType),
        }
    }
}

/// The event tracer control
pub static EVENT_PRINT: EventPrintControl = EventPrintControl::new();
