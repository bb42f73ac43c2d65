// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Build version table for Qbitel FirmCore

use core::fmt;

/// Semantic version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Patch version
    pub patch: u8,
}

impl Version {
    /// Version of this build
    pub const CURRENT: Self = Self {
        major: 0,
        minor: 3,
        patch: 0,
    };
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version string of this build
pub const VERSION_STR: &str = concat!("firmcore ", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_is_nonempty() {
        assert!(VERSION_STR.starts_with("firmcore "));
    }

    #[test]
    fn current_matches_package() {
        let v = Version::CURRENT;
        assert_eq!((v.major, v.minor, v.patch), (0, 3, 0));
    }
}
