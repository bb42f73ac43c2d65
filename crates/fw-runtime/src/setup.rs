// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Open-phase module sequencing
//!
//! `open()` brings every module up in dependency order; it runs on the
//! open task before any other task leaves the barrier, and exactly once.
//! Also owns the operator-visible device name.

use crate::control;
use crate::event;
use crate::io;
use crate::output;
use crate::periodic::{self, PeriodicId};
use crate::settings::{self, ParamValue, SettingId, MAX_STR_LEN};
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};
use fw_common::version::VERSION_STR;
use fw_common::{log_info, Error, Result};
use heapless::String;

/// Heartbeat period
const HEARTBEAT_MS: u32 = 500;

struct DeviceName(UnsafeCell<String<MAX_STR_LEN>>);

// SAFETY: Accessed only through the settings callbacks, which hold the
// Settings mutex, and the boot default path.
unsafe impl Sync for DeviceName {}

static DEVICE_NAME: DeviceName = DeviceName(UnsafeCell::new(String::new()));

static OPENED: AtomicBool = AtomicBool::new(false);

static HEARTBEAT_LEVEL: AtomicBool = AtomicBool::new(false);

/// Status LED heartbeat tick
fn heartbeat(_now_ms: u32) {
    let level = !HEARTBEAT_LEVEL.load(Ordering::Relaxed);
    HEARTBEAT_LEVEL.store(level, Ordering::Relaxed);

    let _ = output::set(&crate::gpio::LED_STATUS, &level);
}

/// Bring the application from reset to ready: events, IO, settings,
/// controls, then the heartbeat. One-shot; re-entry is a no-op.
///
/// # Errors
/// Propagates module initialisation failures.
pub fn open() -> Result<()> {
    if OPENED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    event::init()?;
    io::open()?;
    settings::init()?;
    control::open()?;

    periodic::create(PeriodicId::Heartbeat, HEARTBEAT_MS, heartbeat)?;
    periodic::start(PeriodicId::Heartbeat)?;

    log_info!("setup", "{} open complete", VERSION_STR);
    Ok(())
}

/// Settings read callback for `DeviceName`
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn get_param(id: SettingId) -> Result<ParamValue> {
    match id {
        SettingId::DeviceName => {
            // SAFETY: Serialised by the Settings mutex; see DeviceName.
            let name = unsafe { &*DEVICE_NAME.0.get() };
            Ok(ParamValue::Str(name.clone()))
        }
        _ => Err(Error::UnknownType),
    }
}

/// Settings write callback for `DeviceName`
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn set_param(id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
    let _ = bootup;

    match (id, value) {
        (SettingId::DeviceName, ParamValue::Str(text)) => {
            // SAFETY: Serialised by the Settings mutex; see DeviceName.
            let name = unsafe { &mut *DEVICE_NAME.0.get() };
            name.clear();
            let _ = name.push_str(text.as_str());
            Ok(())
        }
        _ => Err(Error::UnknownType),
    }
}
