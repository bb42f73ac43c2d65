// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Output capability and registry
//!
//! Dual of [`crate::input`]: outputs consume a tagged value after the
//! typed accessor has checked the caller's type against the element's
//! registered output tag.

use crate::io::{self, Element, IoData, IoId, IoMeta};
use fw_common::{contract, Error, Result};

/// An output-capable IO element
pub trait Output: Sync {
    /// Shared metadata block
    fn meta(&self) -> &IoMeta;

    /// Write the carried value to the device
    ///
    /// # Errors
    /// Propagates device failures.
    fn consume(&self, data: &IoData<'_>) -> Result<()>;

    /// One-shot device initialisation
    ///
    /// # Errors
    /// Propagates device failures.
    fn init(&self) -> Result<()>;

    /// Command-boundary fallback for unregistered element types
    ///
    /// # Errors
    /// `UnknownType` unless the device overrides it.
    fn cmd_output(&self, args: &[&str]) -> Result<()> {
        let _ = args;
        Err(Error::UnknownType)
    }
}

/// The registered outputs, in id order
static OUTPUT_LIST: &[&'static dyn Output] = &[
    &crate::uart::CONSOLE,
    &crate::gpio::LED_STATUS,
    &crate::gpio::BUTTON_USER,
];

/// Typed write with tag check and print mediation
///
/// # Errors
/// Raises an `InvalidType` contract fault when `T`'s tag differs from
/// the element's registered output tag; propagates device failures.
pub fn set<T: Element>(output: &dyn Output, value: &T) -> Result<()> {
    let meta = output.meta();

    contract::require(meta.output_type().is_some(), Error::InvalidPointer)?;
    contract::require(meta.output_type() == Some(T::TAG), Error::InvalidType)?;

    let data = value.to_data();
    output.consume(&data)?;

    if meta.print_io() {
        io::print(
            meta.family.as_str(),
            meta.name,
            meta.id,
            &data,
            io::Direction::Output,
        );
    }

    Ok(())
}

/// Look an output up by id
///
/// # Errors
/// Raises an `InvalidId` contract fault for an id outside the universe.
pub fn get_by_id(id: IoId) -> Result<Option<&'static dyn Output>> {
    contract::require((id as u32) < io::NUM_IO_IDS, Error::InvalidId)?;

    Ok(OUTPUT_LIST
        .iter()
        .find(|output| output.meta().id == id)
        .copied())
}

/// Look an output up by name
#[must_use]
pub fn get_by_name(name: &str) -> Option<&'static dyn Output> {
    OUTPUT_LIST
        .iter()
        .find(|output| output.meta().name == name)
        .copied()
}

/// Initialise every registered output exactly once
///
/// # Errors
/// Propagates device initialisation failures.
pub fn init_output_list() -> Result<()> {
    for output in OUTPUT_LIST {
        output.init()?;
    }
    Ok(())
}
