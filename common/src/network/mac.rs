//! # Canonical Hardware Addresses
//!
//! Every address that enters the system, whether typed by the operator or
//! returned by the upstream API, is reduced to a [`CanonicalAddress`]: twelve
//! lowercase hex nibbles with no separators. This is the only key used for
//! matching, deduplication and side-table lookups.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::AddressError;

/// Number of hex digits in a 48-bit hardware address.
pub const NIBBLES: usize = 12;

/// A hardware address in its fixed-width, separator-free form.
///
/// Can only be obtained through [`CanonicalAddress::parse`], so holding one
/// guarantees twelve valid lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalAddress([u8; NIBBLES]);

impl CanonicalAddress {
    /// Normalizes address text.
    ///
    /// Colons, periods and hyphens are stripped, so `00:11:22:33:44:55`,
    /// `0011.2233.4455`, `00-11-22-33-44-55` and `001122334455` all produce
    /// the same value.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let clean: Vec<u8> = input
            .bytes()
            .filter(|b| !is_separator(*b))
            .map(|b| b.to_ascii_lowercase())
            .collect();

        if clean.len() != NIBBLES {
            return Err(AddressError::InvalidLength(input.to_string()));
        }
        if !clean.iter().all(u8::is_ascii_hexdigit) {
            return Err(AddressError::InvalidCharacter(input.to_string()));
        }

        let mut nibbles = [0u8; NIBBLES];
        nibbles.copy_from_slice(&clean);
        Ok(Self(nibbles))
    }

    /// The bare twelve-character key, e.g. `001122334455`.
    pub fn as_str(&self) -> &str {
        // Only ASCII hex digits are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Numeric value (0..=15) of the nibble at `idx`.
    pub fn nibble(&self, idx: usize) -> u8 {
        hex_value(self.0[idx]).unwrap_or(0)
    }
}

impl FromStr for CanonicalAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Colon-separated display form, e.g. `00:11:22:33:44:55`.
impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, pair) in self.0.chunks(2).enumerate() {
            if idx > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}{}", pair[0] as char, pair[1] as char)?;
        }
        Ok(())
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub(crate) fn is_separator(b: u8) -> bool {
    matches!(b, b':' | b'.' | b'-')
}

pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
