use crate::status::{TransactionStatus, TransactionType};

/// Bad numeric input for a cents/dollars conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    NotNumeric(String),
    OutOfRange(String),
    /// A cents value that is not a whole number.
    FractionalCents(String),
    NegativePrice(String),
    /// An offset without a price was staged for submission.
    MissingPrice(String),
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotNumeric(input) => write!(f, "not a number: {input:?}"),
            Self::OutOfRange(input) => write!(f, "amount out of range: {input}"),
            Self::FractionalCents(input) => write!(f, "cents must be whole: {input}"),
            Self::NegativePrice(input) => write!(f, "price must not be negative: {input}"),
            Self::MissingPrice(token) => write!(f, "offset {token} has no price"),
        }
    }
}

impl std::error::Error for ConversionError {}

/// Malformed token or transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdentifierError {
    Arity { input: String, parts: usize },
    NotNumeric { input: String, part: String },
    OutOfRange { input: String, part: String },
    MissingSeparator(String),
    MalformedTimestamp(String),
    MalformedAddress(String),
}

impl std::fmt::Display for InvalidIdentifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arity { input, parts } => {
                write!(f, "token id {input:?} has {parts} parts, expected shard.realm.num")
            }
            Self::NotNumeric { input, part } => {
                write!(f, "token id {input:?}: part {part:?} is not numeric")
            }
            Self::OutOfRange { input, part } => {
                write!(f, "token id {input:?}: part {part} is out of range")
            }
            Self::MissingSeparator(input) => {
                write!(f, "transaction id {input:?} has no '@' separator")
            }
            Self::MalformedTimestamp(input) => {
                write!(f, "transaction id {input:?} has no seconds.nanos timestamp")
            }
            Self::MalformedAddress(input) => write!(f, "invalid contract address {input:?}"),
        }
    }
}

impl std::error::Error for InvalidIdentifierError {}

/// Price-range lookup and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    NotFound(String),
    /// Range exists but carries no usable bounds.
    Unpriced(String),
    OutOfRange {
        token_id: String,
        cents: i64,
        min: i64,
        max: i64,
    },
    Inverted {
        token_id: String,
        min: i64,
        max: i64,
    },
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no price range for token {id}"),
            Self::Unpriced(id) => write!(f, "price range for token {id} has no bounds"),
            Self::OutOfRange {
                token_id,
                cents,
                min,
                max,
            } => write!(
                f,
                "price {cents} for token {token_id} is outside [{min}, {max}]"
            ),
            Self::Inverted { token_id, min, max } => {
                write!(f, "price range for token {token_id} is inverted: {min} > {max}")
            }
        }
    }
}

impl std::error::Error for RangeError {}

/// Status model violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    UnknownStatus(String),
    UnknownType(String),
    NotInLifecycle {
        txn_type: TransactionType,
        status: TransactionStatus,
    },
    TypeMismatch {
        left: TransactionType,
        right: TransactionType,
    },
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStatus(s) => write!(f, "unknown transaction status {s:?}"),
            Self::UnknownType(s) => write!(f, "unknown transaction type {s:?}"),
            Self::NotInLifecycle { txn_type, status } => {
                write!(f, "status {status} is not part of the {txn_type} lifecycle")
            }
            Self::TypeMismatch { left, right } => {
                write!(f, "cannot compare {left} progress with {right} progress")
            }
        }
    }
}

impl std::error::Error for StatusError {}

/// First failure hit while building a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    Identifier {
        index: usize,
        source: InvalidIdentifierError,
    },
    Conversion {
        index: usize,
        source: ConversionError,
    },
}

impl BatchError {
    /// Position of the offending offset in the input.
    pub fn index(&self) -> usize {
        match self {
            Self::Identifier { index, .. } | Self::Conversion { index, .. } => *index,
        }
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier { index, source } => write!(f, "offset #{index}: {source}"),
            Self::Conversion { index, source } => write!(f, "offset #{index}: {source}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Identifier { source, .. } => Some(source),
            Self::Conversion { source, .. } => Some(source),
        }
    }
}
