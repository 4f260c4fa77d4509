//! Ledger identifier encodings.
//!
//! Token ids are `shard.realm.num` triples. On-chain calls address a token by
//! its 20-byte contract address: shard (4 bytes), realm (8 bytes) and num
//! (8 bytes), big-endian, rendered as 40 lowercase hex characters.
//! Transaction ids pair the payer triple with a consensus timestamp:
//! `0.0.47664997@1659651494.601490554`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidIdentifierError;

/// Default transaction explorer root.
pub const HASHSCAN_BASE_URL: &str = "https://hashscan.io/#";

const ADDRESS_LEN: usize = 20;

/// A `shard.realm.num` token (or account) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId {
    pub shard: u32,
    pub realm: u64,
    pub num: u64,
}

impl TokenId {
    pub fn to_address(&self) -> ContractAddress {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[..4].copy_from_slice(&self.shard.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
        bytes[12..].copy_from_slice(&self.num.to_be_bytes());
        ContractAddress(bytes)
    }
}

fn parse_part(input: &str, part: &str, max: u64) -> Result<u64, InvalidIdentifierError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidIdentifierError::NotNumeric {
            input: input.to_string(),
            part: part.to_string(),
        });
    }
    let out_of_range = || InvalidIdentifierError::OutOfRange {
        input: input.to_string(),
        part: part.to_string(),
    };
    let value: u64 = part.parse().map_err(|_| out_of_range())?;
    if value > max {
        return Err(out_of_range());
    }
    Ok(value)
}

impl FromStr for TokenId {
    type Err = InvalidIdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = input.split('.').collect();
        let [shard, realm, num] = parts[..] else {
            return Err(InvalidIdentifierError::Arity {
                input: input.to_string(),
                parts: parts.len(),
            });
        };
        // Entity numbers are signed 64-bit on the ledger; the shard gets 4 address bytes.
        let entity_max = i64::MAX as u64;
        Ok(Self {
            shard: parse_part(input, shard, u32::MAX as u64)? as u32,
            realm: parse_part(input, realm, entity_max)?,
            num: parse_part(input, num, entity_max)?,
        })
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 20-byte contract address of a token, as expected by on-chain calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractAddress([u8; ADDRESS_LEN]);

impl ContractAddress {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_token_id(&self) -> TokenId {
        let mut shard = [0u8; 4];
        let mut realm = [0u8; 8];
        let mut num = [0u8; 8];
        shard.copy_from_slice(&self.0[..4]);
        realm.copy_from_slice(&self.0[4..12]);
        num.copy_from_slice(&self.0[12..]);
        TokenId {
            shard: u32::from_be_bytes(shard),
            realm: u64::from_be_bytes(realm),
            num: u64::from_be_bytes(num),
        }
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContractAddress {
    type Err = InvalidIdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let digits = input.strip_prefix("0x").unwrap_or(input);
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| InvalidIdentifierError::MalformedAddress(input.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContractAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContractAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Map a `shard.realm.num` token id to its contract address.
pub fn token_id_to_address(token_id: &str) -> Result<ContractAddress, InvalidIdentifierError> {
    Ok(token_id.parse::<TokenId>()?.to_address())
}

/// Inverse of [`token_id_to_address`].
pub fn address_to_token_id(address: &str) -> Result<TokenId, InvalidIdentifierError> {
    let address: ContractAddress = address.parse()?;
    let token_id = address.to_token_id();
    let entity_max = i64::MAX as u64;
    if token_id.realm > entity_max || token_id.num > entity_max {
        return Err(InvalidIdentifierError::MalformedAddress(address.to_string()));
    }
    Ok(token_id)
}

/// `payer@seconds.nanos` transaction identifier.
///
/// Renders exactly as parsed: the nanos keep their digit count, so
/// `0.0.1@2.3` stays `0.0.1@2.3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub payer: TokenId,
    pub seconds: u64,
    pub nanos: u32,
    nanos_digits: u8,
}

impl TransactionId {
    /// Canonical form with nanos padded to nine digits.
    pub fn new(payer: TokenId, seconds: u64, nanos: u32) -> Self {
        Self {
            payer,
            seconds,
            nanos,
            nanos_digits: 9,
        }
    }

    /// URL-path-safe form: `0.0.47664997-1659651494-601490554`.
    pub fn encode_reference(&self) -> String {
        format!("{}-{}-{}", self.payer, self.seconds, self.nanos_text())
    }

    fn nanos_text(&self) -> String {
        format!("{:0width$}", self.nanos, width = usize::from(self.nanos_digits))
    }
}

impl FromStr for TransactionId {
    type Err = InvalidIdentifierError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (payer, timestamp) = input
            .split_once('@')
            .ok_or_else(|| InvalidIdentifierError::MissingSeparator(input.to_string()))?;
        let malformed = || InvalidIdentifierError::MalformedTimestamp(input.to_string());
        let (seconds, nanos) = timestamp.split_once('.').ok_or_else(malformed)?;
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(seconds) || !all_digits(nanos) || nanos.len() > 9 {
            return Err(malformed());
        }
        // Leading zeros on seconds would not survive rendering.
        if seconds.len() > 1 && seconds.starts_with('0') {
            return Err(malformed());
        }
        Ok(Self {
            payer: payer.parse()?,
            seconds: seconds.parse().map_err(|_| malformed())?,
            nanos: nanos.parse().map_err(|_| malformed())?,
            nanos_digits: nanos.len() as u8,
        })
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.payer, self.seconds, self.nanos_text())
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encode `triple@secs.nanos` as `triple-secs-nanos`.
pub fn encode_transaction_reference(transaction_id: &str) -> Result<String, InvalidIdentifierError> {
    Ok(transaction_id.parse::<TransactionId>()?.encode_reference())
}

/// Explorer link for a transaction. `network` is passed through as-is.
pub fn explorer_url(base_url: &str, transaction_id: &TransactionId, network: &str) -> String {
    format!(
        "{}/{}/transactionsById/{}",
        base_url.trim_end_matches('/'),
        network,
        transaction_id.encode_reference()
    )
}

/// [`explorer_url`] against the default explorer.
pub fn build_explorer_url(
    transaction_id: &str,
    network: Option<&str>,
) -> Result<String, InvalidIdentifierError> {
    let id: TransactionId = transaction_id.parse()?;
    Ok(explorer_url(
        HASHSCAN_BASE_URL,
        &id,
        network.unwrap_or("testnet"),
    ))
}
