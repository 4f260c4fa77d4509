//! Error types for the offset client.

use offset_types::{BatchError, ConversionError, InvalidIdentifierError, RangeError, StatusError};
use std::fmt;

/// Client error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Pricing oracle failure or non-2xx answer.
    Oracle(String),
    /// Status service failure, non-2xx answer, or a status the model rejects.
    StatusPoll(String),
    /// Offsets or conversion-rate endpoint failure.
    Marketplace(String),
    /// Session store I/O or encoding failure.
    Session(String),
    /// Wallet binding refused or failed the on-chain call.
    Submit(String),
    Conversion(ConversionError),
    Identifier(InvalidIdentifierError),
    Range(RangeError),
    Status(StatusError),
    Batch(BatchError),
}

impl Error {
    /// Oracle and status-poll failures may be retried at the caller's cadence.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Oracle(_) | Error::StatusPoll(_) | Error::Marketplace(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Oracle(msg) => write!(f, "pricing oracle error: {msg}"),
            Error::StatusPoll(msg) => write!(f, "status poll error: {msg}"),
            Error::Marketplace(msg) => write!(f, "marketplace error: {msg}"),
            Error::Session(msg) => write!(f, "session store error: {msg}"),
            Error::Submit(msg) => write!(f, "submission error: {msg}"),
            Error::Conversion(e) => write!(f, "conversion error: {e}"),
            Error::Identifier(e) => write!(f, "invalid identifier: {e}"),
            Error::Range(e) => write!(f, "price range error: {e}"),
            Error::Status(e) => write!(f, "status error: {e}"),
            Error::Batch(e) => write!(f, "batch error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Conversion(e) => Some(e),
            Error::Identifier(e) => Some(e),
            Error::Range(e) => Some(e),
            Error::Status(e) => Some(e),
            Error::Batch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConversionError> for Error {
    fn from(e: ConversionError) -> Self {
        Error::Conversion(e)
    }
}

impl From<InvalidIdentifierError> for Error {
    fn from(e: InvalidIdentifierError) -> Self {
        Error::Identifier(e)
    }
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Error::Range(e)
    }
}

impl From<StatusError> for Error {
    fn from(e: StatusError) -> Self {
        Error::Status(e)
    }
}

impl From<BatchError> for Error {
    fn from(e: BatchError) -> Self {
        Error::Batch(e)
    }
}
