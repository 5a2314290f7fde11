// Fee quote command

use anyhow::Result;
use clap::Args;
use fee_token::{utils::format_amount, TransferRequest};

use super::utils::{info, load_config};

#[derive(Args)]
pub struct QuoteCmd {
    /// Amount in whole tokens (defaults to the configured transfer amount)
    #[arg(long)]
    amount: Option<u64>,
}

pub fn execute(cmd: QuoteCmd, config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let token = config.token_config()?;
    let amount = match cmd.amount {
        Some(amount) => token.base_units(amount)?,
        None => config.transfer_amount()?,
    };

    let quote = TransferRequest::new(amount).quote(&token);
    let decimals = token.decimals();

    info(&format!(
        "Rate {} bps, cap {}",
        token.fee_basis_points(),
        format_amount(token.maximum_fee(), decimals)
    ));
    println!("Amount:   {}", format_amount(amount, decimals));
    println!("Fee:      {}", format_amount(quote.fee(), decimals));
    println!(
        "Received: {}",
        format_amount(amount - quote.fee(), decimals)
    );
    Ok(())
}
