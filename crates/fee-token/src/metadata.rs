//! Token metadata record, validation and sizing
//!
//! Metadata lives in the mint account itself (the metadata pointer points back
//! at the mint), so its serialized length decides how much rent the mint
//! account must hold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use spl_token_metadata_interface::state::TokenMetadata;

use crate::error::{FeeTokenError, FeeTokenResult};

const MAX_NAME_LENGTH: usize = 32;
const MAX_SYMBOL_LENGTH: usize = 12;
const MAX_URI_LENGTH: usize = 200;

/// Descriptive metadata written into the mint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Free-form key/value pairs, written one field update each
    #[serde(default)]
    pub additional: BTreeMap<String, String>,
}

impl MetadataRecord {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
            additional: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    /// Check name, symbol, uri and field keys before anything is planned
    pub fn validate(&self) -> FeeTokenResult<()> {
        if self.name.is_empty() {
            return Err(FeeTokenError::InvalidMetadata("name is empty".into()));
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(FeeTokenError::InvalidMetadata(format!(
                "name longer than {} bytes",
                MAX_NAME_LENGTH
            )));
        }

        if self.symbol.is_empty() {
            return Err(FeeTokenError::InvalidMetadata("symbol is empty".into()));
        }
        if self.symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(FeeTokenError::InvalidMetadata(format!(
                "symbol longer than {} bytes",
                MAX_SYMBOL_LENGTH
            )));
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FeeTokenError::InvalidMetadata(
                "symbol must be alphanumeric".into(),
            ));
        }

        if self.uri.len() > MAX_URI_LENGTH {
            return Err(FeeTokenError::InvalidMetadata(format!(
                "uri longer than {} bytes",
                MAX_URI_LENGTH
            )));
        }

        if self.additional.keys().any(|key| key.is_empty()) {
            return Err(FeeTokenError::InvalidMetadata(
                "additional field key is empty".into(),
            ));
        }

        Ok(())
    }

    /// On-chain representation used for sizing
    pub fn to_token_metadata(&self, mint: &Pubkey) -> TokenMetadata {
        TokenMetadata {
            mint: *mint,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            uri: self.uri.clone(),
            additional_metadata: self
                .additional
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }
}

/// Serializes metadata in the ledger's token-metadata layout.
/// The bytes are only used to size the mint account.
pub trait MetadataSerializer {
    fn serialize(&self, record: &MetadataRecord, mint: &Pubkey) -> FeeTokenResult<Vec<u8>>;
}

/// Borsh layout of the Token-2022 token-metadata interface
#[derive(Clone, Copy, Debug, Default)]
pub struct Token2022MetadataSerializer;

impl MetadataSerializer for Token2022MetadataSerializer {
    fn serialize(&self, record: &MetadataRecord, mint: &Pubkey) -> FeeTokenResult<Vec<u8>> {
        borsh::to_vec(&record.to_token_metadata(mint))
            .map_err(|e| FeeTokenError::SerializationError(e.to_string()))
    }
}
