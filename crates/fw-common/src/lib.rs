// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FirmCore Common Library
//!
//! This crate provides the types shared by every FirmCore component: the
//! unified error enum, the design-by-contract fault layer, the circular
//! log buffer, millisecond time types, bit utilities, and the build
//! version table.
//!
//! # Features
//!
//! - `std`: Enable standard library support (host builds and tests)
//! - `halt-on-fault`: Start with the `Halt` fault policy instead of `Reboot`
//! - `defmt`: Enable defmt formatting support for embedded debugging
//!
//! No heap allocations are performed - all buffers use fixed-size arrays
//! or heapless collections.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod bits;
pub mod contract;
pub mod errors;
pub mod log;
pub mod time;
pub mod version;

// Re-export commonly used items
pub use contract::{ensure, invariant, require, FaultPolicy};
pub use errors::{Error, Result};
pub use time::Millis;
pub use version::Version;
