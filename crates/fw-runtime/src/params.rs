// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Settings bridges for fw-common subsystems
//!
//! The fault layer, the log buffer, and the version table live below the
//! settings engine and cannot name `SettingId`; this module adapts their
//! knobs to the module callback shape.

use crate::settings::{ParamValue, SettingId, MAX_STR_LEN};
use fw_common::contract::{self, FaultPolicy};
use fw_common::log::{self, LogLevel};
use fw_common::version::VERSION_STR;
use fw_common::{Error, Result};
use heapless::String;

/// Settings read callback for `ErrorPolicy`, `LogLevel`, and `FwVersion`
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn get_param(id: SettingId) -> Result<ParamValue> {
    match id {
        SettingId::ErrorPolicy => Ok(ParamValue::Uint(contract::policy() as u32)),
        SettingId::LogLevel => Ok(ParamValue::Uint(log::min_level() as u32)),
        SettingId::FwVersion => {
            let mut text: String<MAX_STR_LEN> = String::new();
            let take = VERSION_STR.len().min(MAX_STR_LEN);
            let _ = text.push_str(&VERSION_STR[..take]);
            Ok(ParamValue::Str(text))
        }
        _ => Err(Error::UnknownType),
    }
}

/// Settings write callback for `ErrorPolicy` and `LogLevel`
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn set_param(id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
    let _ = bootup;

    match (id, value) {
        (SettingId::ErrorPolicy, ParamValue::Uint(v)) => {
            contract::set_policy(FaultPolicy::from(*v));
            Ok(())
        }
        (SettingId::LogLevel, ParamValue::Uint(v)) => {
            log::set_min_level(LogLevel::from(*v));
            Ok(())
        }
        _ => Err(Error::UnknownType),
    }
}
