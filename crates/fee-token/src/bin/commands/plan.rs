// Offline creation plan

use anyhow::Result;
use fee_token::{
    plan_token_creation, CreationRequest, EphemeralKeyProvider, KeyProvider, KeyRole,
    MintAuthorities, Token2022MetadataSerializer,
};
use solana_sdk::{packet::PACKET_DATA_SIZE, rent::Rent, signature::Signer};

use super::utils::{info, load_config, success};

/// Plan against throwaway keys and default rent; nothing is sent
pub fn execute(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let token = config.token_config()?;
    let extensions = config.extensions();

    let mut keys = EphemeralKeyProvider::new();
    let mut pubkey = |role| -> Result<_> { Ok(keys.keypair(role)?.pubkey()) };
    let request = CreationRequest {
        payer: pubkey(KeyRole::Payer)?,
        mint: pubkey(KeyRole::Mint)?,
        authorities: MintAuthorities {
            mint_authority: pubkey(KeyRole::MintAuthority)?,
            freeze_authority: None,
            transfer_fee_config_authority: pubkey(KeyRole::TransferFeeConfigAuthority)?,
            withdraw_withheld_authority: pubkey(KeyRole::WithdrawWithheldAuthority)?,
            metadata_update_authority: pubkey(KeyRole::MetadataUpdateAuthority)?,
        },
        extensions: &extensions,
        metadata: config.metadata.as_ref(),
    };

    let rent = Rent::default();
    let created = plan_token_creation(&token, &request, &Token2022MetadataSerializer, |len| {
        Ok(rent.minimum_balance(len))
    })?;

    info(&format!("Extensions: {:?}", extensions));
    println!("Mint account:   {} bytes", created.space.mint_len);
    println!("Metadata TLV:   {} bytes", created.space.metadata_len);
    println!("Funded for:     {} bytes", created.space.total());
    println!("Rent (default): {} lamports", created.lamports);
    println!();

    let plans: Vec<_> = std::iter::once(&created.plan)
        .chain(created.metadata_fields.iter())
        .collect();
    let mut largest = 0;
    for (n, plan) in plans.iter().enumerate() {
        let size = plan.transaction_size()?;
        largest = largest.max(size);
        println!(
            "Transaction {} ({:?}, {} bytes, {} signers)",
            n + 1,
            plan.stage(),
            size,
            plan.required_signers().len()
        );
        for (i, operation) in plan.operations().iter().enumerate() {
            println!("  {:>2}. {}", i, operation.name());
        }
    }
    println!();

    success(&format!(
        "{} transactions, largest {} of {} bytes",
        plans.len(),
        largest,
        PACKET_DATA_SIZE
    ));
    Ok(())
}
