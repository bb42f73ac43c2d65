// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ADC IO elements
//!
//! Channels carry `F32` volts: `vref * raw / (2^bits - 1)`, adjusted by
//! the `AdcScale` and `AdcOffsetMv` calibration settings.

use crate::input::Input;
use crate::io::{ElemType, IoData, IoFamily, IoId, IoMeta};
use crate::settings::{ParamValue, SettingId};
use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use fw_common::{Error, Result};

/// Calibration scale factor, stored as f32 bits (default 1.0)
static SCALE_BITS: AtomicU32 = AtomicU32::new(0x3F80_0000);

/// Calibration offset in millivolts (default 0)
static OFFSET_MV: AtomicI32 = AtomicI32::new(0);

fn scale() -> f32 {
    f32::from_bits(SCALE_BITS.load(Ordering::Relaxed))
}

fn offset_mv() -> i32 {
    OFFSET_MV.load(Ordering::Relaxed)
}

/// An ADC channel element
pub struct AdcIo {
    meta: IoMeta,
    port: u32,
    pin: u32,
}

impl AdcIo {
    const fn new(id: IoId, name: &'static str, port: u32, pin: u32) -> Self {
        Self {
            meta: IoMeta::new(id, name, IoFamily::Adc),
            port,
            pin,
        }
    }

    /// Convert a raw conversion to calibrated volts
    fn volts(&self, raw: u32) -> Result<f32> {
        let bits = fw_hal::adc::bit_width(self.port, self.pin)?;
        let vref = fw_hal::adc::reference_voltage()?;

        let full_scale = ((1u64 << bits) - 1) as f32;
        let volts = vref * raw as f32 / full_scale;
        Ok(volts * scale() + offset_mv() as f32 / 1000.0)
    }
}

impl Input for AdcIo {
    fn meta(&self) -> &IoMeta {
        &self.meta
    }

    fn produce(&self) -> Result<IoData<'_>> {
        let raw = fw_hal::adc::read(self.port, self.pin)?;
        Ok(IoData::F32(self.volts(raw)?))
    }

    fn init(&self) -> Result<()> {
        if !self.meta.enter_init() {
            return Ok(());
        }

        fw_hal::adc::open()?;
        self.meta.init_input_info(ElemType::F32);
        fw_hal::adc::start_conversion()
    }
}

/// Input voltage sense on ADC channel 3
pub static ADC_VIN: AdcIo = AdcIo::new(IoId::AdcVin, "adc-vin", 0, 3);

/// Settings callbacks for the calibration parameters
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn get_param(id: SettingId) -> Result<ParamValue> {
    match id {
        SettingId::AdcScale => Ok(ParamValue::Float(scale())),
        SettingId::AdcOffsetMv => Ok(ParamValue::Int(offset_mv())),
        _ => Err(Error::UnknownType),
    }
}

/// Settings callbacks for the calibration parameters
///
/// # Errors
/// `UnknownType` for settings this module does not own.
pub fn set_param(id: SettingId, value: &ParamValue, bootup: bool) -> Result<()> {
    let _ = bootup;

    match (id, value) {
        (SettingId::AdcScale, ParamValue::Float(v)) => {
            SCALE_BITS.store(v.to_bits(), Ordering::Relaxed);
            Ok(())
        }
        (SettingId::AdcOffsetMv, ParamValue::Int(v)) => {
            OFFSET_MV.store(*v, Ordering::Relaxed);
            Ok(())
        }
        _ => Err(Error::UnknownType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_defaults() {
        assert!((scale() - 1.0).abs() < 1e-6);
        assert_eq!(offset_mv(), 0);
    }
}
