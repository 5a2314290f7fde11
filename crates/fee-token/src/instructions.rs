//! Translation of plan operations into Token-2022 instructions

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022::{
    extension::{metadata_pointer, transfer_fee},
    instruction::{initialize_mint2, mint_to, set_authority, AuthorityType},
};
use spl_token_metadata_interface::{instruction as metadata_instruction, state::Field};

use crate::{error::FeeTokenResult, plan::Operation};

/// Token-2022 associated token account for `owner`
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &spl_token_2022::id())
}

pub fn build_instruction(operation: &Operation) -> FeeTokenResult<Instruction> {
    let program_id = spl_token_2022::id();

    let instruction = match operation {
        Operation::CreateAccount {
            payer,
            account,
            lamports,
            space,
        } => system_instruction::create_account(payer, account, *lamports, *space, &program_id),

        Operation::InitializeTransferFeeConfig {
            mint,
            config_authority,
            withdraw_authority,
            fee_basis_points,
            maximum_fee,
        } => transfer_fee::instruction::initialize_transfer_fee_config(
            &program_id,
            mint,
            config_authority.as_ref(),
            withdraw_authority.as_ref(),
            *fee_basis_points,
            *maximum_fee,
        )?,

        Operation::InitializeMetadataPointer {
            mint,
            authority,
            metadata_address,
        } => metadata_pointer::instruction::initialize(
            &program_id,
            mint,
            *authority,
            *metadata_address,
        )?,

        Operation::InitializeMint {
            mint,
            decimals,
            mint_authority,
            freeze_authority,
        } => initialize_mint2(
            &program_id,
            mint,
            mint_authority,
            freeze_authority.as_ref(),
            *decimals,
        )?,

        // Metadata is stored in the mint account itself
        Operation::InitializeMetadata {
            mint,
            update_authority,
            mint_authority,
            name,
            symbol,
            uri,
        } => metadata_instruction::initialize(
            &program_id,
            mint,
            update_authority,
            mint,
            mint_authority,
            name.clone(),
            symbol.clone(),
            uri.clone(),
        ),

        Operation::UpdateMetadataField {
            mint,
            update_authority,
            key,
            value,
        } => metadata_instruction::update_field(
            &program_id,
            mint,
            update_authority,
            Field::Key(key.clone()),
            value.clone(),
        ),

        Operation::CreateAssociatedAccount { payer, owner, mint } => {
            create_associated_token_account_idempotent(payer, owner, mint, &program_id)
        }

        Operation::SetMintAuthority {
            mint,
            current,
            new_authority,
        } => set_authority(
            &program_id,
            mint,
            new_authority.as_ref(),
            AuthorityType::MintTokens,
            current,
            &[],
        )?,

        Operation::MintTo {
            mint,
            destination,
            authority,
            amount,
        } => mint_to(&program_id, mint, destination, authority, &[], *amount)?,

        Operation::TransferCheckedWithFee {
            source,
            mint,
            destination,
            owner,
            amount,
            decimals,
            fee,
        } => transfer_fee::instruction::transfer_checked_with_fee(
            &program_id,
            source,
            mint,
            destination,
            owner,
            &[],
            *amount,
            *decimals,
            *fee,
        )?,

        Operation::HarvestWithheldToMint { mint, sources } => {
            let sources: Vec<&Pubkey> = sources.iter().collect();
            transfer_fee::instruction::harvest_withheld_tokens_to_mint(&program_id, mint, &sources)?
        }

        Operation::WithdrawWithheldFromAccounts {
            mint,
            destination,
            authority,
            sources,
        } => {
            let sources: Vec<&Pubkey> = sources.iter().collect();
            transfer_fee::instruction::withdraw_withheld_tokens_from_accounts(
                &program_id,
                mint,
                destination,
                authority,
                &[],
                &sources,
            )?
        }

        Operation::WithdrawWithheldFromMint {
            mint,
            destination,
            authority,
        } => transfer_fee::instruction::withdraw_withheld_tokens_from_mint(
            &program_id,
            mint,
            destination,
            authority,
            &[],
        )?,
    };

    Ok(instruction)
}
