//! Mint account sizing

use serde::{Deserialize, Serialize};
use spl_token_2022::{extension::ExtensionType, state::Mint};

use crate::error::FeeTokenResult;

/// Size of a Token-2022 extension type tag
pub const TYPE_SIZE: usize = 2;
/// Size of a Token-2022 extension length field
pub const LENGTH_SIZE: usize = 2;

/// Mint extensions this crate knows how to configure
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MintExtension {
    TransferFee,
    MetadataPointer,
}

impl MintExtension {
    pub fn extension_type(self) -> ExtensionType {
        match self {
            MintExtension::TransferFee => ExtensionType::TransferFeeConfig,
            MintExtension::MetadataPointer => ExtensionType::MetadataPointer,
        }
    }
}

/// Space reserved for a mint account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountSpace {
    /// Base mint plus fixed-length extensions; allocated by the create-account op
    pub mint_len: usize,
    /// TLV entry for the metadata written after mint initialization
    pub metadata_len: usize,
}

impl AccountSpace {
    /// Size a mint for `extensions` plus a metadata payload of `metadata_payload_len` bytes.
    /// Pass zero when the mint carries no metadata.
    pub fn calculate(
        extensions: &[MintExtension],
        metadata_payload_len: usize,
    ) -> FeeTokenResult<Self> {
        let mint_len = mint_len(extensions)?;
        let metadata_len = if metadata_payload_len == 0 {
            0
        } else {
            TYPE_SIZE + LENGTH_SIZE + metadata_payload_len
        };
        Ok(Self {
            mint_len,
            metadata_len,
        })
    }

    /// Total bytes the account must be funded for
    pub fn total(&self) -> usize {
        self.mint_len + self.metadata_len
    }
}

/// Base mint size plus the fixed TLV size of each extension
pub fn mint_len(extensions: &[MintExtension]) -> FeeTokenResult<usize> {
    let types: Vec<ExtensionType> = extensions.iter().map(|e| e.extension_type()).collect();
    Ok(ExtensionType::try_calculate_account_len::<Mint>(&types)?)
}
