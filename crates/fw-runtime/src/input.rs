// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Input capability and registry
//!
//! Inputs produce a tagged value; the typed accessor [`get`] checks the
//! caller's type against the element's registered input tag, renders
//! through the print sink when the element's print toggle is on, and
//! converts at the boundary.

use crate::io::{self, Element, IoData, IoId, IoMeta};
use fw_common::{contract, Error, Result};
use heapless::String;

/// Fallback text for inputs whose element type has no formatter
pub const UNRECOGNIZED_INPUT: &str = "Unrecognized Input Type\r\n";

/// An input-capable IO element
pub trait Input: Sync {
    /// Shared metadata block
    fn meta(&self) -> &IoMeta;

    /// Read the device and produce the carried value
    ///
    /// # Errors
    /// Propagates device failures.
    fn produce(&self) -> Result<IoData<'_>>;

    /// One-shot device initialisation
    ///
    /// # Errors
    /// Propagates device failures.
    fn init(&self) -> Result<()>;

    /// Command-boundary fallback for unregistered element types
    fn cmd_input(&self) -> String<128> {
        let mut out = String::new();
        let _ = out.push_str(UNRECOGNIZED_INPUT);
        out
    }
}

/// The registered inputs, in id order
static INPUT_LIST: &[&'static dyn Input] = &[
    &crate::uart::CONSOLE,
    &crate::gpio::LED_STATUS,
    &crate::gpio::BUTTON_USER,
    &crate::adc::ADC_VIN,
];

/// Typed read with tag check and print mediation
///
/// # Errors
/// Raises an `InvalidType` contract fault when `T`'s tag differs from
/// the element's registered input tag; propagates device failures.
pub fn get<T: Element>(input: &dyn Input) -> Result<T> {
    let meta = input.meta();

    contract::require(meta.input_type().is_some(), Error::InvalidPointer)?;
    contract::require(meta.input_type() == Some(T::TAG), Error::InvalidType)?;

    let data = input.produce()?;

    if meta.print_io() {
        io::print(
            meta.family.as_str(),
            meta.name,
            meta.id,
            &data,
            io::Direction::Input,
        );
    }

    T::from_data(&data).ok_or(Error::InvalidType)
}

/// Look an input up by id
///
/// # Errors
/// Raises an `InvalidId` contract fault for an id outside the universe.
pub fn get_by_id(id: IoId) -> Result<Option<&'static dyn Input>> {
    contract::require((id as u32) < io::NUM_IO_IDS, Error::InvalidId)?;

    Ok(INPUT_LIST
        .iter()
        .find(|input| input.meta().id == id)
        .copied())
}

/// Look an input up by name
#[must_use]
pub fn get_by_name(name: &str) -> Option<&'static dyn Input> {
    INPUT_LIST
        .iter()
        .find(|input| input.meta().name == name)
        .copied()
}

/// Initialise every registered input exactly once
///
/// # Errors
/// Propagates device initialisation failures.
pub fn init_input_list() -> Result<()> {
    for input in INPUT_LIST {
        input.init()?;
    }
    Ok(())
}
