use std::{fs, str::FromStr};

use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::{
    authority::Handoff,
    error::{FeeTokenError, FeeTokenResult},
    fee::TokenConfig,
    metadata::MetadataRecord,
    plan::{HarvestStrategy, DEFAULT_HARVEST_BATCH_SIZE},
    space::MintExtension,
};

/// Launch configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LaunchConfig {
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub keys: KeysConfig,

    /// Token parameters in whole tokens
    pub token: TokenSection,

    /// Omit to create a mint without metadata
    #[serde(default)]
    pub metadata: Option<MetadataRecord>,

    #[serde(default)]
    pub harvest: HarvestConfig,

    #[serde(default)]
    pub authority: AuthorityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub rpc_url: String,

    /// processed, confirmed or finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Explorer cluster parameter: custom, devnet, testnet or mainnet-beta
    #[serde(default = "default_explorer_cluster")]
    pub explorer_cluster: String,

    /// Lamports airdropped to the payer before launch; 0 disables
    #[serde(default = "default_airdrop_lamports")]
    pub airdrop_lamports: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeysConfig {
    pub directory: String,

    /// Write generated keys to `directory`; otherwise keys live for one run
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenSection {
    pub decimals: u8,
    pub fee_basis_points: u16,
    pub maximum_fee: u64,
    pub mint_supply: u64,
    pub transfer_amount: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarvestConfig {
    pub strategy: HarvestStrategy,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandoffMode {
    #[default]
    Keep,
    Revoke,
    Transfer,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthorityConfig {
    pub handoff: HandoffMode,

    /// Required when `handoff = "transfer"`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_pubkey_serde"
    )]
    pub new_authority: Option<Pubkey>,
}

const EXPLORER_CLUSTERS: &[&str] = &["custom", "devnet", "testnet", "mainnet-beta"];

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_explorer_cluster() -> String {
    "custom".to_string()
}

fn default_airdrop_lamports() -> u64 {
    2_000_000_000 // 2 SOL
}

impl LaunchConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> FeeTokenResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FeeTokenError::Config(format!("Failed to read config file {}: {}", path, e)))?;
        let config: LaunchConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> FeeTokenResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| FeeTokenError::Config(format!("Failed to write config file {}: {}", path, e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> FeeTokenResult<()> {
        if self.cluster.rpc_url.is_empty() {
            return Err(FeeTokenError::Config("rpc_url cannot be empty".into()));
        }
        self.commitment()?;
        if !EXPLORER_CLUSTERS.contains(&self.cluster.explorer_cluster.as_str()) {
            return Err(FeeTokenError::Config(format!(
                "unknown explorer_cluster {}",
                self.cluster.explorer_cluster
            )));
        }

        let token = self.token_config()?;
        let transfer = self.transfer_amount()?;
        if transfer > token.mint_supply() {
            return Err(FeeTokenError::InvalidParameters(format!(
                "transfer_amount {} exceeds mint_supply {}",
                self.token.transfer_amount, self.token.mint_supply
            )));
        }

        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }

        if self.harvest.batch_size == 0 {
            return Err(FeeTokenError::Config("harvest batch_size must be greater than 0".into()));
        }

        self.handoff()?;
        Ok(())
    }

    pub fn commitment(&self) -> FeeTokenResult<CommitmentConfig> {
        CommitmentConfig::from_str(&self.cluster.commitment).map_err(|_| {
            FeeTokenError::Config(format!("invalid commitment {}", self.cluster.commitment))
        })
    }

    /// Token parameters converted to base units
    pub fn token_config(&self) -> FeeTokenResult<TokenConfig> {
        TokenConfig::from_ui(
            self.token.decimals,
            self.token.fee_basis_points,
            self.token.maximum_fee,
            self.token.mint_supply,
        )
    }

    /// Transfer amount in base units
    pub fn transfer_amount(&self) -> FeeTokenResult<u64> {
        crate::fee::to_base_units(self.token.transfer_amount, self.token.decimals)
    }

    /// Metadata needs the pointer; the transfer fee extension is always on
    pub fn extensions(&self) -> Vec<MintExtension> {
        let mut extensions = vec![MintExtension::TransferFee];
        if self.metadata.is_some() {
            extensions.push(MintExtension::MetadataPointer);
        }
        extensions
    }

    pub fn handoff(&self) -> FeeTokenResult<Option<Handoff>> {
        match self.authority.handoff {
            HandoffMode::Keep => Ok(None),
            HandoffMode::Revoke => Ok(Some(Handoff::Revoke)),
            HandoffMode::Transfer => {
                let key = self.authority.new_authority.ok_or_else(|| {
                    FeeTokenError::Config("handoff = \"transfer\" requires new_authority".into())
                })?;
                Ok(Some(Handoff::TransferTo(key)))
            }
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            keys: KeysConfig::default(),
            token: TokenSection::default(),
            metadata: None,
            harvest: HarvestConfig::default(),
            authority: AuthorityConfig::default(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            commitment: default_commitment(),
            explorer_cluster: default_explorer_cluster(),
            airdrop_lamports: default_airdrop_lamports(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            directory: "./keys".to_string(),
            persist: true,
        }
    }
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            decimals: 9,
            fee_basis_points: 100, // 1%
            maximum_fee: 9,
            mint_supply: 1_000_000,
            transfer_amount: 1_000,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            strategy: HarvestStrategy::default(),
            batch_size: DEFAULT_HARVEST_BATCH_SIZE,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> FeeTokenResult<()> {
    let example_config = LaunchConfig {
        metadata: Some(
            MetadataRecord::new("Frog Wif Cat", "FWC", "https://example.com/fwc.json")
                .with_field("website", "https://example.com"),
        ),
        ..LaunchConfig::default()
    };
    example_config.save(path)
}

// Pubkeys are stored as base58 strings
mod option_pubkey_serde {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(pubkey: &Option<Pubkey>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match pubkey {
            Some(pubkey) => serializer.serialize_str(&pubkey.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Pubkey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| Pubkey::from_str(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
