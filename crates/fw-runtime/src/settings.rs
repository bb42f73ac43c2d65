// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Settings front-end
//!
//! Typed named settings with permissions. Text is marshalled to a typed
//! value at this boundary and handed to the owning module's callbacks;
//! the reverse path formats with a type-appropriate pattern. Mutations
//! with `save` persist through the flash backend on success. Boot replay
//! runs with `save = false` to prevent self-overwriting.

use crate::parse;
use crate::settings_backend;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};
use fw_common::{contract, Error, Result};
use fw_osal::mutex::{self, MutexId};
use heapless::String;

/// Maximum formatted value length, including room for the terminator on
/// the wire
pub const MAX_STR_LEN: usize = 64;

/// Setting identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SettingId {
    /// Fault-policy selection (see `fw_common::contract`)
    ErrorPolicy = 0,
    /// Minimum recorded log level
    LogLevel = 1,
    /// Operator-visible device name
    DeviceName = 2,
    /// Build version (read-only)
    FwVersion = 3,
    /// ADC calibration scale factor
    AdcScale = 4,
    /// ADC calibration offset in millivolts
    AdcOffsetMv = 5,
    /// Event-print id filter mask
    TraceMask = 6,
    /// Writing non-zero erases the settings region (write-only)
    FactoryReset = 7,
}

/// Number of settings
pub const NUM_SETTINGS: usize = 8;

impl SettingId {
    /// Id from its numeric value
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::ErrorPolicy),
            1 => Some(Self::LogLevel),
            2 => Some(Self::DeviceName),
            3 => Some(Self::FwVersion),
            4 => Some(Self::AdcScale),
            5 => Some(Self::AdcOffsetMv),
            6 => Some(Self::TraceMask),
            7 => Some(Self::FactoryReset),
            _ => None,
        }
    }
}

/// Declared value type of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    /// Signed 32-bit, decimal text
    Int,
    /// Unsigned 32-bit, decimal text
    Uint,
    /// Unsigned 32-bit, hexadecimal text
    Hex,
    /// Text up to `MAX_STR_LEN`
    Str,
    /// 32-bit float
    Float,
}

/// Access permission of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Write-only
    Set,
    /// Read-only
    Get,
    /// Readable and writable
    SetGet,
}

/// Typed value crossing the module callback boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Signed value (INT)
    Int(i32),
    /// Unsigned value (UINT and HEX)
    Uint(u32),
    /// Float value (FLOAT)
    Float(f32),
    /// Text value (STR)
    Str(String<MAX_STR_LEN>),
}

/// Module read callback
pub type GetParam = fn(SettingId) -> Result<ParamValue>;

/// Module write callback; `bootup` marks default application and replay
pub type SetParam = fn(SettingId, &ParamValue, bool) -> Result<()>;

/// Compile-time setting descriptor
pub struct Setting {
    /// Setting identity
    pub id: SettingId,
    /// Declared value type
    pub stype: SettingType,
    /// Access permission
    pub permission: Permission,
    get_param: GetParam,
    set_param: SetParam,
}

const SETTINGS_LIST: [Setting; NUM_SETTINGS] = [
    Setting {
        id: SettingId::ErrorPolicy,
        stype: SettingType::Uint,
        permission: Permission::SetGet,
        get_param: crate::params::get_param,
        set_param: crate::params::set_param,
    },
    Setting {
        id: SettingId::LogLevel,
        stype: SettingType::Uint,
        permission: Permission::SetGet,
        get_param: crate::params::get_param,
        set_param: crate::params::set_param,
    },
    Setting {
        id: SettingId::DeviceName,
        stype: SettingType::Str,
        permission: Permission::SetGet,
        get_param: crate::setup::get_param,
        set_param: crate::setup::set_param,
    },
    Setting {
        id: SettingId::FwVersion,
        stype: SettingType::Str,
        permission: Permission::Get,
        get_param: crate::params::get_param,
        set_param: crate::params::set_param,
    },
    Setting {
        id: SettingId::AdcScale,
        stype: SettingType::Float,
        permission: Permission::SetGet,
        get_param: crate::adc::get_param,
        set_param: crate::adc::set_param,
    },
    Setting {
        id: SettingId::AdcOffsetMv,
        stype: SettingType::Int,
        permission: Permission::SetGet,
        get_param: crate::adc::get_param,
        set_param: crate::adc::set_param,
    },
    Setting {
        id: SettingId::TraceMask,
        stype: SettingType::Hex,
        permission: Permission::SetGet,
        get_param: crate::control::get_param,
        set_param: crate::control::set_param,
    },
    Setting {
        id: SettingId::FactoryReset,
        stype: SettingType::Uint,
        permission: Permission::Set,
        get_param: crate::settings_backend::get_param,
        set_param: crate::settings_backend::set_param,
    },
];

/// Default applied at boot, before replaying flash; `None` keeps the
/// module's compile-time state
fn default_value(id: SettingId) -> Option<ParamValue> {
    match id {
        SettingId::ErrorPolicy | SettingId::FwVersion | SettingId::FactoryReset => None,
        SettingId::LogLevel => Some(ParamValue::Uint(2)),
        SettingId::DeviceName => {
            let mut name = String::new();
            let _ = name.push_str("qbitel-node");
            Some(ParamValue::Str(name))
        }
        SettingId::AdcScale => Some(ParamValue::Float(1.0)),
        SettingId::AdcOffsetMv => Some(ParamValue::Int(0)),
        SettingId::TraceMask => Some(ParamValue::Uint(0)),
    }
}

static INITED: AtomicBool = AtomicBool::new(false);

fn descriptor(id: SettingId) -> &'static Setting {
    &SETTINGS_LIST[id as usize]
}

/// Set a setting from text; persists when `save` and the write succeeded
///
/// # Errors
/// `WriteFailed` for a read-only setting; otherwise whatever the owning
/// module or the backend reports.
pub fn set(id: SettingId, value: &str, save: bool) -> Result<()> {
    mutex::take(MutexId::Settings)?;
    let result = set_unlocked(id, value, save);
    mutex::give(MutexId::Settings)?;
    result
}

pub(crate) fn set_unlocked(id: SettingId, value: &str, save: bool) -> Result<()> {
    let setting = descriptor(id);
    contract::invariant(setting.id == id, Error::InvalidIndex)?;

    if setting.permission == Permission::Get {
        return Err(Error::WriteFailed);
    }

    let parsed = match setting.stype {
        SettingType::Int => ParamValue::Int(parse::parse_i32(value)),
        SettingType::Uint => ParamValue::Uint(parse::parse_u32(value)),
        SettingType::Hex => ParamValue::Uint(parse::parse_u32_hex(value)),
        SettingType::Float => ParamValue::Float(parse::parse_f32(value)),
        SettingType::Str => {
            let mut text: String<MAX_STR_LEN> = String::new();
            for c in value.chars() {
                if text.push(c).is_err() {
                    break; // Truncate at capacity
                }
            }
            ParamValue::Str(text)
        }
    };

    (setting.set_param)(id, &parsed, false)?;

    if save {
        settings_backend::save_setting(id, value)?;
    }

    Ok(())
}

/// Read a setting, formatted per its declared type, into `out`
///
/// # Errors
/// `ReadFailed` for a write-only setting; otherwise whatever the owning
/// module reports.
pub fn get(id: SettingId, out: &mut String<MAX_STR_LEN>) -> Result<()> {
    mutex::take(MutexId::Settings)?;
    let result = get_unlocked(id, out);
    mutex::give(MutexId::Settings)?;
    result
}

fn get_unlocked(id: SettingId, out: &mut String<MAX_STR_LEN>) -> Result<()> {
    out.clear();

    let setting = descriptor(id);
    contract::invariant(setting.id == id, Error::InvalidIndex)?;

    if setting.permission == Permission::Set {
        return Err(Error::ReadFailed);
    }

    let value = (setting.get_param)(id)?;

    match (setting.stype, &value) {
        (SettingType::Int, ParamValue::Int(v)) => {
            let _ = write!(out, "{v}");
        }
        (SettingType::Uint, ParamValue::Uint(v)) => {
            let _ = write!(out, "{v}");
        }
        (SettingType::Hex, ParamValue::Uint(v)) => {
            let _ = write!(out, "0x{v:X}");
        }
        (SettingType::Str, ParamValue::Str(v)) => {
            let _ = write!(out, "{v}");
        }
        (SettingType::Float, ParamValue::Float(v)) => {
            let _ = write!(out, "{v:.6}");
        }
        _ => {
            contract::invariant(false, Error::UnknownType)?;
        }
    }

    Ok(())
}

/// Initialise the settings engine: defaults, backend, then flash replay
///
/// # Errors
/// Propagates module and backend failures.
pub fn init() -> Result<()> {
    if INITED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    for setting in &SETTINGS_LIST {
        if setting.permission == Permission::Get {
            continue;
        }
        if let Some(default) = default_value(setting.id) {
            (setting.set_param)(setting.id, &default, true)?;
        }
    }

    settings_backend::backend_init()?;
    settings_backend::load_settings()
}

/// Unit-test accessors
pub mod test_access {
    use super::{settings_backend, Result};

    /// Re-run backend discovery and flash replay (power-cycle simulation)
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn reload() -> Result<()> {
        settings_backend::backend_init()?;
        settings_backend::load_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_indexed_by_id() {
        for (i, setting) in SETTINGS_LIST.iter().enumerate() {
            assert_eq!(setting.id as usize, i);
        }
    }

    #[test]
    fn id_conversion_bounds() {
        assert_eq!(SettingId::from_u32(0), Some(SettingId::ErrorPolicy));
        assert_eq!(SettingId::from_u32(7), Some(SettingId::FactoryReset));
        assert_eq!(SettingId::from_u32(8), None);
    }
}
