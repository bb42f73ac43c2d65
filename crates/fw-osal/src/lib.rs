// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel FirmCore OS Abstraction Layer
//!
//! This crate defines the minimal kernel surface the application layer
//! depends on: statically backed tasks with bitwise notification signals,
//! id-keyed mutexes, millisecond software timers, point-to-point queues,
//! a monotonic millisecond clock, and stack diagnostics.
//!
//! Real kernel ports (FreeRTOS-class schedulers) implement [`kernel::KernelOps`]
//! out of tree. The in-tree [`host`] backend implements it on std threads
//! with a virtual clock and is used by the test suites and the host demo.
//!
//! # Features
//!
//! - `std`: Enable standard library support and the host backend

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod kernel;
pub mod mutex;
pub mod queue;
pub mod task;
pub mod timer;

#[cfg(feature = "std")]
pub mod host;

pub use kernel::{KernelOps, StackInfo, TaskHandle};
pub use mutex::MutexId;
pub use timer::TimerId;
