//! Acceptable price bands per token class, as answered by the pricing oracle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::currency::format_currency;
use crate::error::RangeError;
use crate::offset::{KeyedNft, Nft};

/// Shown when a range has no usable bounds.
pub const RANGE_PLACEHOLDER: &str = "–";

/// One oracle answer. Bounds are cents; `code`/`message` report per-item outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPriceRange {
    pub nft_id: Nft,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OffsetPriceRange {
    /// Both bounds, when present and non-zero.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min != 0 && max != 0 => Some((min, max)),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self.bounds() {
            Some((min, max)) => format!(
                "{} - {}",
                format_currency(min, None, None),
                format_currency(max, None, None)
            ),
            None => RANGE_PLACEHOLDER.to_string(),
        }
    }
}

/// `POST /price` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRangeRequest {
    pub nfts: Vec<KeyedNft>,
}

impl PriceRangeRequest {
    /// One entry per distinct token id, first serial wins, input order kept.
    pub fn for_nfts<'a>(nfts: impl IntoIterator<Item = &'a Nft>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let nfts = nfts
            .into_iter()
            .filter(|nft| seen.insert(nft.token_id.clone()))
            .map(|nft| KeyedNft {
                nft_id: nft.clone(),
            })
            .collect();
        Self { nfts }
    }

    pub fn is_empty(&self) -> bool {
        self.nfts.is_empty()
    }
}

/// `POST /price` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRangeResponse {
    #[serde(default)]
    pub request: Vec<KeyedNft>,
    #[serde(default)]
    pub prices: Vec<OffsetPriceRange>,
}

/// Resolved ranges keyed by exact token id string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceRanges {
    by_token: HashMap<String, OffsetPriceRange>,
}

impl PriceRanges {
    /// Rejects inverted bands. Duplicate token ids keep the first answer.
    pub fn from_prices(prices: Vec<OffsetPriceRange>) -> Result<Self, RangeError> {
        let mut by_token = HashMap::with_capacity(prices.len());
        for range in prices {
            if let (Some(min), Some(max)) = (range.min_price, range.max_price) {
                if min > max {
                    return Err(RangeError::Inverted {
                        token_id: range.nft_id.token_id,
                        min,
                        max,
                    });
                }
            }
            by_token.entry(range.nft_id.token_id.clone()).or_insert(range);
        }
        Ok(Self { by_token })
    }

    pub fn get(&self, token_id: &str) -> Result<&OffsetPriceRange, RangeError> {
        self.by_token
            .get(token_id)
            .ok_or_else(|| RangeError::NotFound(token_id.to_string()))
    }

    /// `"$0.63 - $0.68"`, or the placeholder when a bound is missing or zero.
    pub fn range_for_id(&self, token_id: &str) -> Result<String, RangeError> {
        Ok(self.get(token_id)?.display())
    }

    /// Check a user-entered listing price (cents) against the band.
    pub fn validate_price(&self, token_id: &str, cents: i64) -> Result<(), RangeError> {
        let (min, max) = self
            .get(token_id)?
            .bounds()
            .ok_or_else(|| RangeError::Unpriced(token_id.to_string()))?;
        if cents < min || cents > max {
            return Err(RangeError::OutOfRange {
                token_id: token_id.to_string(),
                cents,
                min,
                max,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OffsetPriceRange> {
        self.by_token.values()
    }
}

/// Free-function form of [`PriceRanges::range_for_id`].
pub fn range_for_id(token_id: &str, ranges: &PriceRanges) -> Result<String, RangeError> {
    ranges.range_for_id(token_id)
}

/// Pre-fill choice for the listing price field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePreset {
    #[default]
    None,
    Min,
    Max,
}

impl PricePreset {
    pub fn suggested(self, range: &OffsetPriceRange) -> Option<i64> {
        let (min, max) = range.bounds()?;
        match self {
            Self::None => None,
            Self::Min => Some(min),
            Self::Max => Some(max),
        }
    }
}
