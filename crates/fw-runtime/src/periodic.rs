// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Periodic scheduler
//!
//! Callback registration at millisecond granularity, backed by a single
//! kernel software timer created lazily on first use. The timer callback
//! walks the table and invokes every enabled entry whose period has
//! elapsed. Table mutation is serialised by the `Periodic` mutex; the
//! tick itself reads the table without taking it, which is sound because
//! entries are only redefined while disabled.

use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{AtomicBool, Ordering};
use fw_common::{contract, Error, Millis, Result};
use fw_osal::timer::{self, TimerId};

/// Timer resolution
const FIDELITY_MS: u32 = 1;

/// Periodic identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PeriodicId {
    /// Status LED heartbeat
    Heartbeat = 0,
}

/// Number of periodics
pub const NUM_PERIODICS: usize = 1;

/// Periodic callback, invoked with the current millisecond clock
pub type CallbackFunc = fn(u32);

#[derive(Clone, Copy)]
struct Periodic {
    period_ms: u32,
    callback: Option<CallbackFunc>,
    enabled: bool,
    last_call_ms: Millis,
}

const IDLE: Periodic = Periodic {
    period_ms: 0,
    callback: None,
    enabled: false,
    last_call_ms: Millis::ZERO,
};

static mut PERIODIC_LIST: [Periodic; NUM_PERIODICS] = [IDLE; NUM_PERIODICS];

static TIMER_CREATED: AtomicBool = AtomicBool::new(false);

/// Walks the table and calls every enabled entry whose period elapsed.
fn call_callbacks(curr_time_ms: u32) {
    let now = Millis::new(curr_time_ms);

    for i in 0..NUM_PERIODICS {
        // SAFETY: Entries are only redefined while disabled and under the
        // Periodic mutex; an enabled entry is stable for the lifetime of
        // this tick.
        let entry = unsafe { &mut (*addr_of_mut!(PERIODIC_LIST))[i] };

        let elapsed = entry
            .last_call_ms
            .has_elapsed(now, Millis::new(entry.period_ms));

        if entry.enabled && elapsed {
            if let Some(callback) = entry.callback {
                entry.last_call_ms = now;
                callback(curr_time_ms);
            }
        }
    }
}

fn create_timer() -> Result<()> {
    if TIMER_CREATED.load(Ordering::Acquire) {
        return Ok(());
    }

    let created = timer::create(TimerId::Periodic, call_callbacks, FIDELITY_MS, true);
    contract::invariant(created.is_ok(), Error::DeviceInitFailed)?;

    TIMER_CREATED.store(true, Ordering::Release);
    Ok(())
}

fn start_timer() -> Result<()> {
    create_timer()?;
    if timer::is_running(TimerId::Periodic) {
        return Ok(());
    }
    timer::start(TimerId::Periodic)
}

/// Stops the global timer when no periodic remains enabled.
fn stop_timer() -> Result<()> {
    create_timer()?;

    // SAFETY: Called with the Periodic mutex held.
    let any_enabled = unsafe {
        (*addr_of!(PERIODIC_LIST))
            .iter()
            .any(|entry| entry.enabled)
    };

    if any_enabled || !timer::is_running(TimerId::Periodic) {
        return Ok(());
    }

    timer::stop(TimerId::Periodic)
}

/// Store period and callback for a periodic
///
/// Redefining either field with a different value while the periodic is
/// enabled is fatal.
///
/// # Errors
/// Raises a `TooManyAttempts` contract fault on an enabled redefinition
/// and propagates kernel failures.
pub fn create(id: PeriodicId, period_ms: u32, callback: CallbackFunc) -> Result<()> {
    contract::require(period_ms > 0, Error::InvalidTime)?;

    fw_osal::mutex::take(fw_osal::mutex::MutexId::Periodic)?;

    // SAFETY: Guarded by the Periodic mutex.
    let entry = unsafe { &mut (*addr_of_mut!(PERIODIC_LIST))[id as usize] };

    let result = if entry.enabled {
        let same_period = entry.period_ms == period_ms;
        let same_callback = entry.callback.map(|f| f as usize) == Some(callback as usize);
        contract::invariant(same_period, Error::TooManyAttempts)
            .and_then(|()| contract::invariant(same_callback, Error::TooManyAttempts))
    } else {
        entry.period_ms = period_ms;
        entry.callback = Some(callback);
        Ok(())
    };

    fw_osal::mutex::give(fw_osal::mutex::MutexId::Periodic)?;
    result
}

/// Enable a periodic; ensures the global timer is running
///
/// # Errors
/// Raises an `InvalidPointer` contract fault for a periodic that was
/// never created and propagates kernel failures.
pub fn start(id: PeriodicId) -> Result<()> {
    fw_osal::mutex::take(fw_osal::mutex::MutexId::Periodic)?;

    // SAFETY: Guarded by the Periodic mutex.
    let entry = unsafe { &mut (*addr_of_mut!(PERIODIC_LIST))[id as usize] };

    let result = contract::require(entry.callback.is_some(), Error::InvalidPointer)
        .and_then(|()| {
            entry.last_call_ms = Millis::new(timer::curr_time_ms());
            entry.enabled = true;
            start_timer()
        });

    fw_osal::mutex::give(fw_osal::mutex::MutexId::Periodic)?;
    result
}

/// Disable a periodic; the global timer stops once none remain enabled
///
/// # Errors
/// Propagates kernel failures.
pub fn stop(id: PeriodicId) -> Result<()> {
    fw_osal::mutex::take(fw_osal::mutex::MutexId::Periodic)?;

    // SAFETY: Guarded by the Periodic mutex.
    let entry = unsafe { &mut (*addr_of_mut!(PERIODIC_LIST))[id as usize] };
    entry.enabled = false;

    let result = stop_timer();

    fw_osal::mutex::give(fw_osal::mutex::MutexId::Periodic)?;
    result
}

/// Unit-test accessors
pub mod test_access {
    use super::{addr_of, PeriodicId, PERIODIC_LIST};

    /// Configured period of a periodic
    #[must_use]
    pub fn get_period(id: PeriodicId) -> u32 {
        // SAFETY: Test-only read, serialised by the test harness.
        unsafe { (*addr_of!(PERIODIC_LIST))[id as usize].period_ms }
    }

    /// Enabled flag of a periodic
    #[must_use]
    pub fn get_enabled(id: PeriodicId) -> bool {
        // SAFETY: Test-only read, serialised by the test harness.
        unsafe { (*addr_of!(PERIODIC_LIST))[id as usize].enabled }
    }
}
