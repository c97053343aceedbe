//! # Address Pattern Matching
//!
//! Compiles operator input into a [`MacMatcher`]. Input without `*` or `[` is
//! an exact address; anything else is a positional pattern of twelve nibble
//! matchers:
//!
//! * a hex digit matches itself (1 nibble),
//! * `*` matches any byte (2 nibbles),
//! * `[set]` matches one nibble from a set of digits and ranges, e.g. `[1-4]`.
//!
//! Separators (`:`, `.`, `-`) outside brackets are ignored, so
//! `00:11:22:33:44:*` and `0011223344*` compile to the same matcher.

use std::fmt;

use crate::error::PatternError;
use crate::network::mac::{self, CanonicalAddress, NIBBLES};

/// One positional rule within a wildcard pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nibble {
    Exact(u8),
    Any,
    /// Bit `n` set means nibble value `n` is accepted.
    Set(u16),
}

impl Nibble {
    fn accepts(self, value: u8) -> bool {
        match self {
            Nibble::Exact(expected) => expected == value,
            Nibble::Any => true,
            Nibble::Set(mask) => mask & (1 << value) != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Exact(CanonicalAddress),
    Pattern(Vec<Nibble>),
    Any,
}

/// A compiled address predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacMatcher {
    rule: Rule,
    display: String,
}

impl MacMatcher {
    /// Compiles an exact address or a wildcard pattern.
    pub fn compile(input: &str) -> Result<Self, PatternError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PatternError::Empty);
        }

        if !input.contains('*') && !input.contains('[') {
            let addr = CanonicalAddress::parse(input)?;
            return Ok(Self::exact(addr));
        }

        let nibbles = compile_nibbles(input)?;
        Ok(Self {
            rule: Rule::Pattern(nibbles),
            display: input.to_string(),
        })
    }

    /// Matcher for a single known address.
    pub fn exact(addr: CanonicalAddress) -> Self {
        Self {
            rule: Rule::Exact(addr),
            display: addr.to_string(),
        }
    }

    /// Matcher that accepts every address. Used to dump whole tables.
    pub fn any() -> Self {
        Self {
            rule: Rule::Any,
            display: String::from("*"),
        }
    }

    /// Tests raw address text as it arrives from the API.
    ///
    /// Text that does not normalize never matches.
    pub fn matches(&self, address: &str) -> bool {
        CanonicalAddress::parse(address)
            .map(|addr| self.matches_canonical(&addr))
            .unwrap_or(false)
    }

    pub fn matches_canonical(&self, addr: &CanonicalAddress) -> bool {
        match &self.rule {
            Rule::Exact(expected) => expected == addr,
            Rule::Any => true,
            Rule::Pattern(nibbles) => nibbles
                .iter()
                .enumerate()
                .all(|(idx, nibble)| nibble.accepts(addr.nibble(idx))),
        }
    }

    /// `true` for anything other than a single exact address.
    pub fn is_wildcard(&self) -> bool {
        !matches!(self.rule, Rule::Exact(_))
    }

    #[cfg(test)]
    pub(crate) fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for MacMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

fn compile_nibbles(input: &str) -> Result<Vec<Nibble>, PatternError> {
    let clean = input.to_ascii_uppercase();
    let bytes = clean.as_bytes();
    let mut nibbles: Vec<Nibble> = Vec::with_capacity(NIBBLES);
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b if mac::is_separator(b) => idx += 1,
            b'*' => {
                nibbles.push(Nibble::Any);
                nibbles.push(Nibble::Any);
                idx += 1;
            }
            b'[' => {
                let close = bytes[idx..]
                    .iter()
                    .position(|b| *b == b']')
                    .ok_or(PatternError::UnmatchedBracket)?;
                let token = &clean[idx..=idx + close];
                nibbles.push(parse_bracket(token)?);
                idx += close + 1;
            }
            b => {
                let value = mac::hex_value(b)
                    .ok_or_else(|| PatternError::InvalidCharacter(input.to_string()))?;
                nibbles.push(Nibble::Exact(value));
                idx += 1;
            }
        }
    }

    if nibbles.len() != NIBBLES {
        return Err(PatternError::InvalidLength(input.to_string()));
    }
    Ok(nibbles)
}

/// Parses a `[...]` token (brackets included) into a nibble set.
///
/// `a-b` is an inclusive range; a hyphen at either end of the set is a
/// literal and adds nothing since `-` is never a hex digit.
fn parse_bracket(token: &str) -> Result<Nibble, PatternError> {
    let inner = &token.as_bytes()[1..token.len() - 1];
    if inner.is_empty() {
        return Err(PatternError::EmptyBracket);
    }

    let invalid = || PatternError::InvalidBracket(token.to_string());
    let mut mask: u16 = 0;
    let mut idx = 0;

    while idx < inner.len() {
        let b = inner[idx];
        if b == b'-' {
            idx += 1;
            continue;
        }
        let low = mac::hex_value(b).ok_or_else(invalid)?;

        let is_range = idx + 2 < inner.len() && inner[idx + 1] == b'-';
        if is_range {
            let high = mac::hex_value(inner[idx + 2]).ok_or_else(invalid)?;
            if high < low {
                return Err(invalid());
            }
            for value in low..=high {
                mask |= 1 << value;
            }
            idx += 3;
        } else {
            mask |= 1 << low;
            idx += 1;
        }
    }

    if mask == 0 {
        return Err(invalid());
    }
    Ok(Nibble::Set(mask))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
