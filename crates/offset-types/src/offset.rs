//! Offset ledger records and the marketplace payloads that carry them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One serial unit of a token class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nft {
    /// `shard.realm.num`, kept as received; validated when encoded.
    pub token_id: String,
    pub serial_number: u64,
}

impl Nft {
    pub fn new(token_id: impl Into<String>, serial_number: u64) -> Self {
        Self {
            token_id: token_id.into(),
            serial_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedNft {
    pub nft_id: Nft,
}

/// A tokenized, priced claim on a carbon-offset credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Cents as delivered by the ledger, or dollars while staged in a listing
    /// form. `None` means not for sale.
    pub price: Option<f64>,
    pub owner_id: String,
    pub nft: Nft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListState {
    Unlisted,
    Listed,
    Purchased,
    #[default]
    All,
}

impl ListState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlisted => "UNLISTED",
            Self::Listed => "LISTED",
            Self::Purchased => "PURCHASED",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for ListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNLISTED" => Ok(Self::Unlisted),
            "LISTED" => Ok(Self::Listed),
            "PURCHASED" => Ok(Self::Purchased),
            "ALL" => Ok(Self::All),
            other => Err(format!("unknown list state {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetResponse {
    pub list_state: ListState,
    pub offset: Offset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetsQuery {
    pub account_id: String,
    pub list_state: ListState,
    #[serde(default)]
    pub order: Option<String>,
    pub limit: u32,
}

/// `GET /offsets` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetsDataResponse {
    pub req: OffsetsQuery,
    #[serde(default)]
    pub offsets: Vec<OffsetResponse>,
}

impl OffsetsDataResponse {
    /// Unlisted offsets carry a stale price server-side; clear it.
    pub fn normalize_unlisted_prices(&mut self) {
        for entry in &mut self.offsets {
            if entry.list_state == ListState::Unlisted {
                entry.offset.price = None;
            }
        }
    }

    pub fn into_offsets(self) -> Vec<Offset> {
        self.offsets.into_iter().map(|entry| entry.offset).collect()
    }
}

/// `GET /conversion` response, e.g. for `TinybarToCents`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionRateResponse {
    pub rate: f64,
}
