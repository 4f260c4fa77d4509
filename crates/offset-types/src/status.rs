//! Listing and purchase transaction lifecycle.
//!
//! LIST:     PENDING → CREATED → APPROVED → LISTED
//! PURCHASE: PENDING → CREATED → APPROVED → LISTED → PURCHASED
//!
//! Ranks are only comparable within one transaction type. Several on-chain
//! phases share a rank and read as a single "in flight" step.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StatusError;
use crate::identifier::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    List,
    Purchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Created,
    Approved,
    Listed,
    Purchased,
}

const LIST_LIFECYCLE: [(TransactionStatus, u8); 4] = [
    (TransactionStatus::Pending, 1),
    (TransactionStatus::Created, 2),
    (TransactionStatus::Approved, 2),
    (TransactionStatus::Listed, 3),
];

const PURCHASE_LIFECYCLE: [(TransactionStatus, u8); 5] = [
    (TransactionStatus::Pending, 1),
    (TransactionStatus::Created, 2),
    (TransactionStatus::Approved, 2),
    (TransactionStatus::Listed, 2),
    (TransactionStatus::Purchased, 3),
];

impl TransactionType {
    /// Statuses in lifecycle order with their progress rank.
    pub fn lifecycle(self) -> &'static [(TransactionStatus, u8)] {
        match self {
            Self::List => &LIST_LIFECYCLE,
            Self::Purchase => &PURCHASE_LIFECYCLE,
        }
    }

    pub fn terminal(self) -> TransactionStatus {
        match self {
            Self::List => TransactionStatus::Listed,
            Self::Purchase => TransactionStatus::Purchased,
        }
    }

    pub fn rank(self, status: TransactionStatus) -> Result<StatusRank, StatusError> {
        self.lifecycle()
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, rank)| StatusRank {
                txn_type: self,
                rank: *rank,
            })
            .ok_or(StatusError::NotInLifecycle {
                txn_type: self,
                status,
            })
    }

    /// Index of `status` in the lifecycle sequence.
    fn position(self, status: TransactionStatus) -> Option<usize> {
        self.lifecycle().iter().position(|(s, _)| *s == status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Purchase => "PURCHASE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIST" => Ok(Self::List),
            "PURCHASE" => Ok(Self::Purchase),
            other => Err(StatusError::UnknownType(other.to_string())),
        }
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Created => "CREATED",
            Self::Approved => "APPROVED",
            Self::Listed => "LISTED",
            Self::Purchased => "PURCHASED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CREATED" => Ok(Self::Created),
            "APPROVED" => Ok(Self::Approved),
            "LISTED" => Ok(Self::Listed),
            "PURCHASED" => Ok(Self::Purchased),
            other => Err(StatusError::UnknownStatus(other.to_string())),
        }
    }
}

/// Progress of a transaction. Ranks of different types are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRank {
    pub txn_type: TransactionType,
    pub rank: u8,
}

impl StatusRank {
    pub fn compare(&self, other: &Self) -> Result<Ordering, StatusError> {
        self.partial_cmp(other).ok_or(StatusError::TypeMismatch {
            left: self.txn_type,
            right: other.txn_type,
        })
    }
}

impl PartialOrd for StatusRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.txn_type != other.txn_type {
            return None;
        }
        Some(self.rank.cmp(&other.rank))
    }
}

/// Outcome of feeding a polled status into a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Advanced {
        from: TransactionStatus,
        to: TransactionStatus,
    },
    /// Same rank, later lifecycle step (e.g. CREATED → APPROVED).
    Relabeled {
        from: TransactionStatus,
        to: TransactionStatus,
    },
    Unchanged,
    /// Lower rank than already stored; the stored status is kept.
    Regressed {
        stored: TransactionStatus,
        received: TransactionStatus,
    },
}

impl Observation {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Advanced { .. } | Self::Relabeled { .. })
    }
}

/// A submitted listing or purchase being tracked to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "transactionId")]
    pub transaction_id: TransactionId,
    #[serde(rename = "type")]
    pub txn_type: TransactionType,
    pub status: TransactionStatus,
}

impl Transaction {
    pub fn pending(transaction_id: TransactionId, txn_type: TransactionType) -> Self {
        Self {
            transaction_id,
            txn_type,
            status: TransactionStatus::Pending,
        }
    }

    pub fn rank(&self) -> Result<StatusRank, StatusError> {
        self.txn_type.rank(self.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.status == self.txn_type.terminal()
    }

    /// Apply a status reported by the status service. Never moves backwards.
    pub fn observe(&mut self, received: TransactionStatus) -> Result<Observation, StatusError> {
        let incoming = self.txn_type.rank(received)?;
        let current = self.rank()?;
        let observation = match incoming.compare(&current)? {
            Ordering::Greater => Observation::Advanced {
                from: self.status,
                to: received,
            },
            Ordering::Less => Observation::Regressed {
                stored: self.status,
                received,
            },
            Ordering::Equal => {
                if self.txn_type.position(received) > self.txn_type.position(self.status) {
                    Observation::Relabeled {
                        from: self.status,
                        to: received,
                    }
                } else {
                    Observation::Unchanged
                }
            }
        };
        if observation.changed() {
            self.status = received;
        }
        Ok(observation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusRequest {
    pub txn_id: String,
    pub txn_type: String,
}

/// `GET /offsets/txn` response. `state` is parsed by the caller so unknown
/// values surface as errors instead of failing the whole decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub request: TransactionStatusRequest,
    pub state: String,
}

impl TransactionStatusResponse {
    pub fn status(&self) -> Result<TransactionStatus, StatusError> {
        self.state.parse()
    }
}
