//! Batch representation for on-chain listing and purchase calls.

use serde::{Deserialize, Serialize};

use crate::currency::to_cents;
use crate::error::{BatchError, ConversionError};
use crate::identifier::{ContractAddress, TransactionId, token_id_to_address};
use crate::offset::Offset;

/// Parallel arrays: index `i` of each describes the same offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmission {
    pub token_ids: Vec<ContractAddress>,
    pub serial_ids: Vec<u64>,
    pub prices: Vec<u64>,
}

impl BatchSubmission {
    pub fn len(&self) -> usize {
        self.token_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty()
    }
}

/// `POST /offsets/list` and `POST /offsets/purchase` answer. Fields other
/// than the transaction id are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchActionResponse {
    #[serde(default, alias = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

fn whole_cents(price: f64) -> Result<i64, ConversionError> {
    if !price.is_finite() {
        return Err(ConversionError::NotNumeric(price.to_string()));
    }
    if price.fract() != 0.0 {
        return Err(ConversionError::FractionalCents(price.to_string()));
    }
    if price.abs() > i64::MAX as f64 {
        return Err(ConversionError::OutOfRange(price.to_string()));
    }
    Ok(price as i64)
}

fn batch_price(offset: &Offset, convert_to_cents: bool) -> Result<u64, ConversionError> {
    let price = offset
        .price
        .ok_or_else(|| ConversionError::MissingPrice(offset.nft.token_id.clone()))?;
    let cents = if convert_to_cents {
        to_cents(price)?
    } else {
        whole_cents(price)?
    };
    u64::try_from(cents).map_err(|_| ConversionError::NegativePrice(price.to_string()))
}

/// Build the submission for `offsets`, in order. `convert_to_cents` treats
/// prices as dollars. Nothing is returned unless every offset encodes.
pub fn to_batch_submission(
    offsets: &[Offset],
    convert_to_cents: bool,
) -> Result<BatchSubmission, BatchError> {
    let mut batch = BatchSubmission {
        token_ids: Vec::with_capacity(offsets.len()),
        serial_ids: Vec::with_capacity(offsets.len()),
        prices: Vec::with_capacity(offsets.len()),
    };
    for (index, offset) in offsets.iter().enumerate() {
        let address = token_id_to_address(&offset.nft.token_id)
            .map_err(|source| BatchError::Identifier { index, source })?;
        let price = batch_price(offset, convert_to_cents)
            .map_err(|source| BatchError::Conversion { index, source })?;
        batch.token_ids.push(address);
        batch.serial_ids.push(offset.nft.serial_number);
        batch.prices.push(price);
    }
    Ok(batch)
}
