// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FirmCore Hardware Abstraction Layer
//!
//! This crate defines the platform-agnostic peripheral traits the
//! application layer is written against, and the facade functions that
//! delegate to the board installed at start-up. Register-level ports
//! implement [`traits::BoardOps`] out of tree; the in-tree [`sim`] board
//! implements every peripheral in RAM and is used by the test suites and
//! the host demo.
//!
//! Peripheral trait methods default to no-ops reporting success, so a
//! board only implements what its platform actually has.
//!
//! # Features
//!
//! - `std`: Enable standard library support and the simulated board

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod adc;
pub mod board;
pub mod flash;
pub mod gpio;
pub mod mem;
pub mod power;
pub mod traits;
pub mod uart;

#[cfg(feature = "std")]
pub mod sim;

pub use traits::{ActiveState, BoardOps, HeapInfo};
