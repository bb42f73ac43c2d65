// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Behavioral tests for fw-common
//!
//! Covers the fault policy routing and the global log surface. Tests that
//! touch process-wide state serialise on a single lock.

use fw_common::contract::{self, FaultPolicy};
use fw_common::log::{self, LogLevel};
use fw_common::{log_info, log_warn, Error};
use std::sync::{Mutex, MutexGuard, OnceLock};

fn serial() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

#[test]
fn propagated_fault_reaches_the_caller() {
    let _guard = serial();
    contract::set_policy(FaultPolicy::Propagate);

    fn guarded(len: usize) -> Result<usize, Error> {
        contract::require(len <= 8, Error::InvalidLength)?;
        Ok(len * 2)
    }

    assert_eq!(guarded(4), Ok(8));
    assert_eq!(guarded(9), Err(Error::InvalidLength));
}

#[test]
fn fault_is_recorded_in_the_log() {
    let _guard = serial();
    contract::set_policy(FaultPolicy::Propagate);
    log::set_min_level(LogLevel::Error);

    let before = log::with_buffer(|b| b.len());
    let _ = contract::invariant(false, Error::QueueOverflow);

    log::with_buffer(|b| {
        assert!(b.len() > before || b.len() == fw_common::log::LOG_BUFFER_SIZE);
        let last = b.iter().last().expect("an entry");
        assert_eq!(last.module, "contract");
        assert!(last.message.as_str().contains("queue overflow"));
    });
}

#[test]
fn reboot_policy_invokes_the_installed_hook() {
    let _guard = serial();

    static FIRED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
    contract::install_reset_hook(|| {
        FIRED.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    contract::set_policy(FaultPolicy::Reboot);
    let result = contract::ensure(false, Error::InvariantFailure);
    contract::set_policy(FaultPolicy::Propagate);

    assert_eq!(result, Err(Error::InvariantFailure));
    assert!(FIRED.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn global_log_macros_respect_min_level() {
    let _guard = serial();
    log::set_min_level(LogLevel::Warn);

    let before = log::with_buffer(|b| b.len());
    log_info!("test", "below threshold {}", 1);
    let after_info = log::with_buffer(|b| b.len());
    log_warn!("test", "at threshold");
    let after_warn = log::with_buffer(|b| b.len());

    assert_eq!(before, after_info);
    assert_eq!(after_info + 1, after_warn);

    log::set_min_level(LogLevel::Info);
}

#[test]
fn log_level_setting_round_trip() {
    let _guard = serial();
    log::set_min_level(LogLevel::from(3));
    assert_eq!(log::min_level(), LogLevel::Debug);
    log::set_min_level(LogLevel::from(2));
    assert_eq!(log::min_level(), LogLevel::Info);
}
