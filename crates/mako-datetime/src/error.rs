//! Error types for mako-datetime operations.

use thiserror::Error;

/// Why a conversion or one of its steps was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The instant has no UTC offset, or is not at the local anchor point an
    /// operation requires.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The conversion plan (or one of its meanings) is not self-consistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Text that could not be read as a datetime at all.
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConversionError>;
