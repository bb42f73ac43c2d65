// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for Qbitel FirmCore
//!
//! This module defines the unified error type used throughout the system.
//! All errors are designed to be no_std compatible and provide detailed
//! error information without heap allocation.
//!
//! Contract errors (0x01xx) are programming faults: they are never
//! returned by a correct program and are routed through the fault policy
//! in [`crate::contract`]. Device errors (0x02xx) are operational and
//! propagate as ordinary `Result`s. Configuration errors (0x03xx) are
//! reported to the user by the CLI.

use core::fmt;

/// Result type alias for Qbitel FirmCore operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for Qbitel FirmCore
///
/// This enum represents all possible errors that can occur in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Contract Faults (0x01xx)
    // =========================================================================
    /// Null or dangling reference handed across a boundary
    InvalidPointer,
    /// Identifier outside its enumeration
    InvalidId,
    /// Pin number outside the port
    InvalidPin,
    /// Index outside a fixed table
    InvalidIndex,
    /// Length outside a fixed buffer
    InvalidLength,
    /// Cursor or scan position out of range
    InvalidPosition,
    /// Signal bit outside the defined set
    InvalidSignal,
    /// Zero or out-of-range time value
    InvalidTime,
    /// Element type tag mismatch on a typed accessor
    InvalidType,
    /// Table or buffer smaller than required
    TooSmall,
    /// One-shot operation attempted twice
    TooManyAttempts,
    /// Bounded ring had no free slot
    QueueOverflow,
    /// Internal consistency check failed
    InvariantFailure,

    // =========================================================================
    // Device Errors (0x02xx)
    // =========================================================================
    /// Peripheral initialization failed
    DeviceInitFailed,
    /// Peripheral not present on this platform
    DeviceNotFound,
    /// Peripheral operation failed
    DeviceFailed,
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Flash erase failed
    EraseFailed,
    /// Timer or task refused to stop
    StopFailed,
    /// Operation timed out
    Timeout,
    /// Static pool exhausted
    NoMemory,

    // =========================================================================
    // Configuration Errors (0x03xx)
    // =========================================================================
    /// Setting type not recognised by the addressed module
    UnknownType,
    /// No descriptor registered under the given id
    IdNotFound,
    /// Operation forbidden by the setting permission
    PermissionDenied,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Contract faults
    /// - 0x02xx: Device errors
    /// - 0x03xx: Configuration errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Contract faults (0x01xx)
            Self::InvalidPointer => 0x0101,
            Self::InvalidId => 0x0102,
            Self::InvalidPin => 0x0103,
            Self::InvalidIndex => 0x0104,
            Self::InvalidLength => 0x0105,
            Self::InvalidPosition => 0x0106,
            Self::InvalidSignal => 0x0107,
            Self::InvalidTime => 0x0108,
            Self::InvalidType => 0x0109,
            Self::TooSmall => 0x010A,
            Self::TooManyAttempts => 0x010B,
            Self::QueueOverflow => 0x010C,
            Self::InvariantFailure => 0x010D,

            // Device errors (0x02xx)
            Self::DeviceInitFailed => 0x0201,
            Self::DeviceNotFound => 0x0202,
            Self::DeviceFailed => 0x0203,
            Self::ReadFailed => 0x0204,
            Self::WriteFailed => 0x0205,
            Self::EraseFailed => 0x0206,
            Self::StopFailed => 0x0207,
            Self::Timeout => 0x0208,
            Self::NoMemory => 0x0209,

            // Configuration errors (0x03xx)
            Self::UnknownType => 0x0301,
            Self::IdNotFound => 0x0302,
            Self::PermissionDenied => 0x0303,
        }
    }

    /// Check if this is a programming-contract fault
    ///
    /// Contract faults are never returned as recoverable by a correct
    /// program; seeing one outside the `Propagate` fault policy means the
    /// policy handler already ran.
    #[must_use]
    pub const fn is_contract_fault(&self) -> bool {
        self.code() & 0xFF00 == 0x0100
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidPointer => "invalid pointer",
            Self::InvalidId => "invalid id",
            Self::InvalidPin => "invalid pin",
            Self::InvalidIndex => "invalid index",
            Self::InvalidLength => "invalid length",
            Self::InvalidPosition => "invalid position",
            Self::InvalidSignal => "invalid signal",
            Self::InvalidTime => "invalid time",
            Self::InvalidType => "invalid type",
            Self::TooSmall => "too small",
            Self::TooManyAttempts => "too many attempts",
            Self::QueueOverflow => "queue overflow",
            Self::InvariantFailure => "invariant failure",
            Self::DeviceInitFailed => "device init failed",
            Self::DeviceNotFound => "device not found",
            Self::DeviceFailed => "device failed",
            Self::ReadFailed => "read failed",
            Self::WriteFailed => "write failed",
            Self::EraseFailed => "erase failed",
            Self::StopFailed => "stop failed",
            Self::Timeout => "time-out",
            Self::NoMemory => "no memory",
            Self::UnknownType => "unknown type",
            Self::IdNotFound => "id not found",
            Self::PermissionDenied => "permission denied",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_grouped_by_category() {
        assert_eq!(Error::InvalidPointer.code() & 0xFF00, 0x0100);
        assert_eq!(Error::QueueOverflow.code() & 0xFF00, 0x0100);
        assert_eq!(Error::ReadFailed.code() & 0xFF00, 0x0200);
        assert_eq!(Error::IdNotFound.code() & 0xFF00, 0x0300);
    }

    #[test]
    fn contract_fault_classification() {
        assert!(Error::QueueOverflow.is_contract_fault());
        assert!(Error::InvalidType.is_contract_fault());
        assert!(!Error::WriteFailed.is_contract_fault());
        assert!(!Error::UnknownType.is_contract_fault());
    }

    #[test]
    fn descriptions_match_user_surface() {
        assert_eq!(Error::ReadFailed.description(), "read failed");
        assert_eq!(Error::WriteFailed.description(), "write failed");
    }
}
