// Utility functions for CLI commands

use anyhow::{Context, Result};
use fee_token::LaunchConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Load and validate the launch config
pub fn load_config(path: &str) -> Result<LaunchConfig> {
    LaunchConfig::load(path).with_context(|| format!("Failed to load config {}", path))
}

/// Parse a pubkey from string
pub fn parse_pubkey(s: &str) -> Result<Pubkey> {
    Pubkey::from_str(s).context("Invalid public key")
}

/// Print success message
pub fn success(msg: &str) {
    println!("[OK] {}", msg);
}

/// Print info message
pub fn info(msg: &str) {
    println!("[INFO] {}", msg);
}

/// Print warning message
pub fn warn(msg: &str) {
    eprintln!("[WARN] {}", msg);
}
