// Command modules for fee-token CLI

pub mod launch;
pub mod plan;
pub mod quote;
pub mod utils;

use anyhow::{Context, Result};
use fee_token::create_example_config;

use utils::success;

pub fn init_config(path: &str) -> Result<()> {
    create_example_config(path).with_context(|| format!("Failed to write {}", path))?;
    success(&format!("Example configuration written to {}", path));
    Ok(())
}
