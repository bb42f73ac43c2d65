// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Number parsing with C `strtoul`-family semantics
//!
//! The command surface parses the longest valid prefix and yields zero
//! for text with no leading number, which is what the id-or-name
//! disambiguation in the command table relies on (`InvalidId` is zero).

/// Parse an unsigned decimal prefix; 0 when none
#[must_use]
pub fn parse_u32(text: &str) -> u32 {
    let digits = leading(text, |c| c.is_ascii_digit());
    digits.parse().unwrap_or(0)
}

/// Parse a signed decimal prefix; 0 when none
#[must_use]
pub fn parse_i32(text: &str) -> i32 {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1i64, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits = leading(rest, |c| c.is_ascii_digit());
    let magnitude: i64 = digits.parse().unwrap_or(0);
    (sign * magnitude).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Parse a hexadecimal prefix, with or without `0x`; 0 when none
#[must_use]
pub fn parse_u32_hex(text: &str) -> u32 {
    let trimmed = text.trim_start();
    let rest = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits = leading(rest, |c| c.is_ascii_hexdigit());
    u32::from_str_radix(digits, 16).unwrap_or(0)
}

/// Parse a float prefix; 0.0 when none
#[must_use]
pub fn parse_f32(text: &str) -> f32 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    trimmed[..end].parse().unwrap_or(0.0)
}

fn leading(text: &str, accept: impl Fn(char) -> bool) -> &str {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !accept(*c))
        .map_or(trimmed.len(), |(i, _)| i);
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_prefix() {
        assert_eq!(parse_u32("42"), 42);
        assert_eq!(parse_u32("42abc"), 42);
        assert_eq!(parse_u32("abc"), 0);
        assert_eq!(parse_u32(""), 0);
    }

    #[test]
    fn signed_prefix() {
        assert_eq!(parse_i32("-5"), -5);
        assert_eq!(parse_i32("+7"), 7);
        assert_eq!(parse_i32("12x"), 12);
        assert_eq!(parse_i32("x"), 0);
    }

    #[test]
    fn hex_prefix() {
        assert_eq!(parse_u32_hex("0x1F"), 0x1F);
        assert_eq!(parse_u32_hex("1f"), 0x1F);
        assert_eq!(parse_u32_hex("0XFFG"), 0xFF);
        assert_eq!(parse_u32_hex("g"), 0);
    }

    #[test]
    fn float_prefix() {
        assert!((parse_f32("1.5") - 1.5).abs() < 1e-6);
        assert!((parse_f32("-2.25x") + 2.25).abs() < 1e-6);
        assert_eq!(parse_f32("abc"), 0.0);
    }
}
