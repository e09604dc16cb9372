//! Definition of errors.
use std::{fmt, result};

use thiserror::Error;

/// A specialized Result type for UTrie.
pub type Result<T, E = UtrieError> = result::Result<T, E>;

/// Errors in UTrie.
#[derive(Debug, Error)]
pub enum UtrieError {
    /// Contains [`InputError`].
    #[error(transparent)]
    Input(InputError),

    /// Contains [`StateError`].
    #[error(transparent)]
    State(StateError),

    /// Contains [`ScaleError`].
    #[error(transparent)]
    Scale(ScaleError),

    /// Contains [`FormatError`].
    #[error(transparent)]
    Format(FormatError),

    /// Contains [`VersionError`].
    #[error(transparent)]
    Version(VersionError),

    /// I/O error raised while compressing a serialized trie.
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

impl UtrieError {
    pub(crate) const fn input(msg: &'static str, arg: u32) -> Self {
        Self::Input(InputError { msg, arg })
    }
    pub(crate) const fn state(msg: &'static str) -> Self {
        Self::State(StateError { msg })
    }
    pub(crate) const fn scale(arg: &'static str, max: u32) -> Self {
        Self::Scale(ScaleError { arg, max })
    }
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(FormatError { msg: msg.into() })
    }
    pub(crate) const fn version(found: u32, expected: u32) -> Self {
        Self::Version(VersionError { found, expected })
    }
}

/// Error used when an argument is out of range, e.g., a code point above U+10FFFF
/// or an inverted range.
#[derive(Debug)]
pub struct InputError {
    msg: &'static str,
    arg: u32,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InputError: {} (got {:#x})", self.msg, self.arg)
    }
}

impl std::error::Error for InputError {}

/// Error used when a builder is modified after it has been frozen.
#[derive(Debug)]
pub struct StateError {
    msg: &'static str,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StateError: {}", self.msg)
    }
}

impl std::error::Error for StateError {}

/// Error used when the scale of the data exceeds what can be represented.
#[derive(Debug)]
pub struct ScaleError {
    arg: &'static str,
    max: u32,
}

impl fmt::Display for ScaleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ScaleError: {} must be no greater than {}",
            self.arg, self.max
        )
    }
}

impl std::error::Error for ScaleError {}

/// Error used when a serialized trie is malformed or truncated.
#[derive(Debug)]
pub struct FormatError {
    msg: String,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FormatError: {}", self.msg)
    }
}

impl std::error::Error for FormatError {}

/// Error used when a serialized trie was written by an incompatible format version.
#[derive(Debug)]
pub struct VersionError {
    found: u32,
    expected: u32,
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "VersionError: trie was created with an old format (version field {:#x}, expected {:#x})",
            self.found, self.expected
        )
    }
}

impl std::error::Error for VersionError {}
