//! Shared types and pure-logic utilities for the offset marketplace client.
//! Zero network dependency: conversions, identifier encodings, price-range
//! lookups, the transaction status model and batch construction.

mod batch;
mod currency;
mod error;
mod esg;
mod identifier;
mod offset;
mod price_range;
mod status;

pub use batch::{BatchActionResponse, BatchSubmission, to_batch_submission};
pub use currency::{IntoAmount, format_currency, to_cents, to_dollars};
pub use error::{BatchError, ConversionError, InvalidIdentifierError, RangeError, StatusError};
pub use esg::{EsgDetailsResponse, EsgMrv, EsgValue};
pub use identifier::{
    ContractAddress, HASHSCAN_BASE_URL, TokenId, TransactionId, address_to_token_id,
    build_explorer_url, encode_transaction_reference, explorer_url, token_id_to_address,
};
pub use offset::{
    ConversionRateResponse, KeyedNft, ListState, Nft, Offset, OffsetResponse, OffsetsDataResponse,
    OffsetsQuery,
};
pub use price_range::{
    OffsetPriceRange, PricePreset, PriceRangeRequest, PriceRangeResponse, PriceRanges,
    RANGE_PLACEHOLDER, range_for_id,
};
pub use status::{
    Observation, StatusRank, Transaction, TransactionStatus, TransactionStatusRequest,
    TransactionStatusResponse, TransactionType,
};
