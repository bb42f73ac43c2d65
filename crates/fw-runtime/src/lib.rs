// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FirmCore application runtime
//!
//! This crate is the application layer of the firmware: it brings the
//! device from reset to steady state through the two-phase open/run
//! start-up, routes asynchronous events from interrupt sources and timers
//! to their owning tasks over bounded lock-free rings, exposes all I/O
//! through a typed registry, persists named settings in NOR-flash
//! sectors, and hosts the pluggable controls - chief among them the
//! interactive command-line interpreter.
//!
//! The kernel and board are reached exclusively through the `fw-osal` and
//! `fw-hal` seams installed at start-up.
//!
//! # Features
//!
//! - `std`: Enable standard library support (host builds and tests)

#![no_std]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod adc;
pub mod command;
pub mod control;
pub mod control_cli;
pub mod control_event_print;
pub mod event;
pub mod gpio;
pub mod io;
pub mod input;
pub mod output;
pub mod params;
pub mod parse;
pub mod periodic;
pub mod settings;
pub mod settings_backend;
pub mod setup;
pub mod task;
pub mod task_control;
pub mod task_open;
pub mod uart;

pub use event::{Event, EventId};
pub use task::{Signal, TaskId};
