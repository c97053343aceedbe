use thiserror::Error;

/// Address text that cannot be reduced to twelve hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid MAC address length: {0}")]
    InvalidLength(String),
    #[error("invalid MAC address characters: {0}")]
    InvalidCharacter(String),
}

/// Operator input that cannot be compiled into a matcher.
///
/// Messages are shown to the operator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("MAC pattern cannot be empty")]
    Empty,
    #[error("invalid MAC pattern length (need 12 nibbles): {0}")]
    InvalidLength(String),
    #[error("invalid character in MAC pattern: {0}")]
    InvalidCharacter(String),
    #[error("unmatched bracket in MAC pattern")]
    UnmatchedBracket,
    #[error("empty bracket pattern")]
    EmptyBracket,
    #[error("invalid bracket pattern: {0}")]
    InvalidBracket(String),
}

impl From<AddressError> for PatternError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidLength(input) => PatternError::InvalidLength(input),
            AddressError::InvalidCharacter(input) => PatternError::InvalidCharacter(input),
        }
    }
}

/// Failure to read a host override file.
#[derive(Debug, Error)]
pub enum HostsError {
    #[error("failed to read host overrides from {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed host override document")]
    Parse(#[from] serde_yaml::Error),
}
