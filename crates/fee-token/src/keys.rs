//! Identities used across the token lifecycle

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use solana_sdk::{
    signature::{read_keypair_file, write_keypair_file, Keypair},
    signer::Signer,
};
use tracing::{debug, info};

use crate::error::{FeeTokenError, FeeTokenResult};

/// Role a keypair plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Payer,
    Mint,
    MintAuthority,
    TransferFeeConfigAuthority,
    WithdrawWithheldAuthority,
    MetadataUpdateAuthority,
    Owner,
    Recipient,
    FeeVault,
}

impl KeyRole {
    pub const ALL: [KeyRole; 9] = [
        KeyRole::Payer,
        KeyRole::Mint,
        KeyRole::MintAuthority,
        KeyRole::TransferFeeConfigAuthority,
        KeyRole::WithdrawWithheldAuthority,
        KeyRole::MetadataUpdateAuthority,
        KeyRole::Owner,
        KeyRole::Recipient,
        KeyRole::FeeVault,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            KeyRole::Payer => "payer",
            KeyRole::Mint => "mint",
            KeyRole::MintAuthority => "mint-authority",
            KeyRole::TransferFeeConfigAuthority => "transfer-fee-config-authority",
            KeyRole::WithdrawWithheldAuthority => "withdraw-withheld-authority",
            KeyRole::MetadataUpdateAuthority => "metadata-update-authority",
            KeyRole::Owner => "owner",
            KeyRole::Recipient => "recipient",
            KeyRole::FeeVault => "fee-vault",
        }
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Supplies the keypair for each role. The same role always yields the same key.
pub trait KeyProvider {
    fn keypair(&mut self, role: KeyRole) -> FeeTokenResult<Arc<Keypair>>;
}

/// Fresh keys per run, never written anywhere
#[derive(Default)]
pub struct EphemeralKeyProvider {
    keys: HashMap<KeyRole, Arc<Keypair>>,
}

impl EphemeralKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyProvider for EphemeralKeyProvider {
    fn keypair(&mut self, role: KeyRole) -> FeeTokenResult<Arc<Keypair>> {
        Ok(self
            .keys
            .entry(role)
            .or_insert_with(|| Arc::new(Keypair::new()))
            .clone())
    }
}

/// Keys stored as `<dir>/<role>.json` in the solana CLI format.
/// Missing files are generated and written on first use.
pub struct FileKeyProvider {
    directory: PathBuf,
    keys: HashMap<KeyRole, Arc<Keypair>>,
}

impl FileKeyProvider {
    pub fn new(directory: impl Into<PathBuf>) -> FeeTokenResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            keys: HashMap::new(),
        })
    }

    pub fn path_for(&self, role: KeyRole) -> PathBuf {
        self.directory.join(format!("{}.json", role.file_stem()))
    }

    fn load_or_generate(path: &Path, role: KeyRole) -> FeeTokenResult<Keypair> {
        if path.exists() {
            let keypair = read_keypair_file(path).map_err(|e| {
                FeeTokenError::Key(format!("failed to read {}: {}", path.display(), e))
            })?;
            debug!("Loaded {} key {}", role, keypair.pubkey());
            return Ok(keypair);
        }

        let keypair = Keypair::new();
        write_keypair_file(&keypair, path).map_err(|e| {
            FeeTokenError::Key(format!("failed to write {}: {}", path.display(), e))
        })?;
        info!("Generated {} key {} at {}", role, keypair.pubkey(), path.display());
        Ok(keypair)
    }
}

impl KeyProvider for FileKeyProvider {
    fn keypair(&mut self, role: KeyRole) -> FeeTokenResult<Arc<Keypair>> {
        if let Some(keypair) = self.keys.get(&role) {
            return Ok(keypair.clone());
        }
        let keypair = Arc::new(Self::load_or_generate(&self.path_for(role), role)?);
        self.keys.insert(role, keypair.clone());
        Ok(keypair)
    }
}

/// Expand a leading `~` to `$HOME`
pub fn expand_home(path: &str) -> FeeTokenResult<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = std::env::var("HOME")
                .map_err(|_| FeeTokenError::Key("HOME environment variable not set".into()))?;
            Ok(PathBuf::from(format!("{}{}", home, rest)))
        }
        None => Ok(PathBuf::from(path)),
    }
}
