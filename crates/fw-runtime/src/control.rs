// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Controls framework
//!
//! A control is a named, event-driven handler in a fixed ordered set.
//! `disperse_event` forwards an event to each enabled control in
//! registration order until one claims it. Controls may also take part
//! in the settings parameter chain.

use crate::event::Event;
use crate::settings::{ParamValue, SettingId};
use core::fmt::Write;
use fw_common::{Error, Result};
use heapless::String;

/// Outcome of offering an event to a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// The control consumed the event; the walk stops
    Handled,
    /// The event is not for this control
    NotHandled,
}

/// An event-driven handler in the ordered control set
pub trait Control: Sync {
    /// Registration name
    fn name(&self) -> &'static str;

    /// Enabled flag; disabled controls are skipped by the dispatcher
    fn enabled(&self) -> bool;

    /// Flip the enabled flag
    fn set_enabled(&self, enabled: bool);

    /// One-shot initialisation during module open
    ///
    /// # Errors
    /// Propagates device failures.
    fn init_control(&self) -> Result<()>;

    /// Offer an event
    ///
    /// # Errors
    /// Propagates handler failures.
    fn handle_event(&self, event: &Event) -> Result<HandleStatus>;

    /// Settings read hook
    ///
    /// # Errors
    /// `UnknownType` for settings this control does not own.
    fn get_param(&self, id: SettingId) -> Result<ParamValue> {
        let _ = id;
        Err(Error::UnknownType)
    }

    /// Settings write hook
    ///
    /// # Errors
    /// `UnknownType` for settings this control does not own.
    fn set_param(&self, id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
        let _ = (id, value, bootup);
        Err(Error::UnknownType)
    }
}

/// The registered controls with their power-on enabled state
static CONTROL_TABLE: [(&dyn Control, bool); 2] = [
    (&crate::control_cli::CLI, true),
    (&crate::control_event_print::EVENT_PRINT, false),
];

/// Length of the control listing output
const LIST_LEN: usize = 256;

/// Forward an event to each enabled control until one claims it
///
/// # Errors
/// Propagates handler failures.
pub fn disperse_event(event: &Event) -> Result<()> {
    for (control, _) in &CONTROL_TABLE {
        if !control.enabled() {
            continue;
        }

        if control.handle_event(event)? == HandleStatus::Handled {
            break;
        }
    }
    Ok(())
}

/// Find a control whose registered name prefixes `name`; first match wins
#[must_use]
pub fn get_control_by_name(name: &str) -> Option<&'static dyn Control> {
    CONTROL_TABLE
        .iter()
        .find(|(control, _)| name.starts_with(control.name()))
        .map(|(control, _)| *control)
}

/// Render the `<name>: enabled|disabled` listing
#[must_use]
pub fn get_list_of_controls() -> String<LIST_LEN> {
    let mut out = String::new();

    for (control, _) in &CONTROL_TABLE {
        let state = if control.enabled() {
            "enabled"
        } else {
            "disabled"
        };
        let _ = write!(out, "{}: {}\r\n", control.name(), state);
    }

    out
}

/// Apply power-on enabled flags and initialise every control
///
/// # Errors
/// Propagates control initialisation failures.
pub fn open() -> Result<()> {
    for (control, enabled_default) in &CONTROL_TABLE {
        control.set_enabled(*enabled_default);
        control.init_control()?;
    }
    Ok(())
}

/// Settings read chain: first control that recognises the id answers
///
/// # Errors
/// `UnknownType` when no control recognises the id.
pub fn get_param(id: SettingId) -> Result<ParamValue> {
    for (control, _) in &CONTROL_TABLE {
        match control.get_param(id) {
            Err(Error::UnknownType) => continue,
            other => return other,
        }
    }
    Err(Error::UnknownType)
}

/// Settings write chain: first control that recognises the id answers
///
/// # Errors
/// `UnknownType` when no control recognises the id.
pub fn set_param(id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
    for (control, _) in &CONTROL_TABLE {
        match control.set_param(id, value, bootup) {
            Err(Error::UnknownType) => continue,
            other => return other,
        }
    }
    Err(Error::UnknownType)
}
