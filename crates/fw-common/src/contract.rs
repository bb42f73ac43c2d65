// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Design-by-contract checks with a selectable fault policy
//!
//! Preconditions, invariants, and postconditions share one shape: a
//! boolean, an error tag, and the call site (captured via
//! `#[track_caller]`). A failed check routes through the process-wide
//! [`FaultPolicy`]:
//!
//! - **Propagate**: the check returns `Err` and the caller decides —
//!   used under test and wherever the caller must remain live.
//! - **Halt**: busy-loop on site, preserving the stack for a debugger.
//! - **Reboot**: record a diagnostic, request a platform reset through
//!   the installed hook, then return `Err` (a host build without a hook
//!   stays live; on hardware the hook does not return).
//!
//! The policy is exposed to the operator as the `ErrorPolicy` setting.

use crate::errors::Error;
use crate::log;
use core::panic::Location;
use core::ptr::addr_of;
use core::sync::atomic::{AtomicU8, Ordering};

/// Fault handling policy, process-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultPolicy {
    /// Return the fault to the caller as a recoverable error
    Propagate = 0,
    /// Busy-loop at the failure site
    Halt = 1,
    /// Emit a diagnostic and request a platform reset
    Reboot = 2,
}

impl From<u32> for FaultPolicy {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Propagate,
            1 => Self::Halt,
            _ => Self::Reboot,
        }
    }
}

#[cfg(feature = "halt-on-fault")]
const INITIAL_POLICY: u8 = FaultPolicy::Halt as u8;
#[cfg(not(feature = "halt-on-fault"))]
const INITIAL_POLICY: u8 = FaultPolicy::Reboot as u8;

static POLICY: AtomicU8 = AtomicU8::new(INITIAL_POLICY);

/// Platform reset request, installed once at start-up by the port.
static mut RESET_HOOK: Option<fn()> = None;

/// Get the current fault policy
#[must_use]
pub fn policy() -> FaultPolicy {
    FaultPolicy::from(u32::from(POLICY.load(Ordering::Relaxed)))
}

/// Select the fault policy
pub fn set_policy(policy: FaultPolicy) {
    POLICY.store(policy as u8, Ordering::Relaxed);
}

/// Install the platform reset hook used by the `Reboot` policy
///
/// Must be called before tasks start; not re-installed afterwards.
pub fn install_reset_hook(hook: fn()) {
    // SAFETY: Written once during single-threaded start-up, read-only
    // afterwards.
    unsafe {
        RESET_HOOK = Some(hook);
    }
}

fn request_reset() {
    // SAFETY: RESET_HOOK is written only during single-threaded start-up.
    let hook = unsafe { *addr_of!(RESET_HOOK) };
    if let Some(hook) = hook {
        hook();
    }
}

fn fail(error: Error, location: &Location<'_>) -> Error {
    log::write(
        log::LogLevel::Error,
        "contract",
        format_args!("{} at {}:{}", error, location.file(), location.line()),
    );

    match policy() {
        FaultPolicy::Propagate => {}
        FaultPolicy::Halt => loop {
            core::hint::spin_loop();
        },
        FaultPolicy::Reboot => request_reset(),
    }

    error
}

/// Precondition check
///
/// # Errors
/// Returns `error` under the `Propagate` policy when `condition` is false.
#[track_caller]
pub fn require(condition: bool, error: Error) -> Result<(), Error> {
    if condition {
        Ok(())
    } else {
        Err(fail(error, Location::caller()))
    }
}

/// Invariant check
///
/// # Errors
/// Returns `error` under the `Propagate` policy when `condition` is false.
#[track_caller]
pub fn invariant(condition: bool, error: Error) -> Result<(), Error> {
    if condition {
        Ok(())
    } else {
        Err(fail(error, Location::caller()))
    }
}

/// Postcondition check
///
/// # Errors
/// Returns `error` under the `Propagate` policy when `condition` is false.
#[track_caller]
pub fn ensure(condition: bool, error: Error) -> Result<(), Error> {
    if condition {
        Ok(())
    } else {
        Err(fail(error, Location::caller()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_checks_return_ok() {
        set_policy(FaultPolicy::Propagate);
        assert!(require(true, Error::InvalidId).is_ok());
        assert!(invariant(true, Error::InvariantFailure).is_ok());
        assert!(ensure(true, Error::InvalidLength).is_ok());
    }

    #[test]
    fn propagate_returns_the_tag() {
        set_policy(FaultPolicy::Propagate);
        assert_eq!(require(false, Error::InvalidId), Err(Error::InvalidId));
        assert_eq!(
            invariant(false, Error::QueueOverflow),
            Err(Error::QueueOverflow)
        );
    }

    #[test]
    fn policy_round_trips_through_u32() {
        assert_eq!(FaultPolicy::from(0), FaultPolicy::Propagate);
        assert_eq!(FaultPolicy::from(1), FaultPolicy::Halt);
        assert_eq!(FaultPolicy::from(2), FaultPolicy::Reboot);
        assert_eq!(FaultPolicy::from(7), FaultPolicy::Reboot);
    }
}
