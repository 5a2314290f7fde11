//! JSON-RPC backed ledger access

use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use spl_token_2022::{
    extension::{transfer_fee::TransferFeeAmount, BaseStateWithExtensions, StateWithExtensions},
    state::Account,
};
use tracing::debug;

use crate::{
    error::{FeeTokenError, FeeTokenResult, SubmissionError},
    ledger::{AccountReader, Faucet, HolderAccount, LedgerSubmitter},
    plan::InstructionPlan,
};

/// Token account layout starts with the mint
const MINT_OFFSET: usize = 0;

/// Ledger access over a blocking RPC client
pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), commitment),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl LedgerSubmitter for RpcLedger {
    fn submit(
        &self,
        plan: &InstructionPlan,
        signers: &[&Keypair],
    ) -> Result<Signature, SubmissionError> {
        let instructions = plan
            .instructions()
            .map_err(|e| SubmissionError::ProgramRejected(e.to_string()))?;
        let blockhash = self.client.get_latest_blockhash()?;

        let mut transaction = Transaction::new_with_payer(&instructions, Some(&plan.fee_payer()));
        transaction
            .try_sign(signers, blockhash)
            .map_err(|e| SubmissionError::SignatureMismatch(e.to_string()))?;

        debug!(
            "Sending {:?} transaction with {} instructions",
            plan.stage(),
            instructions.len()
        );
        Ok(self.client.send_and_confirm_transaction(&transaction)?)
    }
}

impl AccountReader for RpcLedger {
    fn token_accounts(&self, mint: &Pubkey) -> FeeTokenResult<Vec<HolderAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                MINT_OFFSET,
                mint.as_ref(),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.client.commitment()),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .client
            .get_program_accounts_with_config(&spl_token_2022::id(), config)
            .map_err(|e| FeeTokenError::Rpc(format!("token accounts of {}: {}", mint, e)))?;

        Ok(accounts
            .into_iter()
            .filter_map(|(address, account)| {
                let holder = decode_holder(address, &account.data);
                if holder.is_none() {
                    debug!("Skipping {}: not a token account", address);
                }
                holder
            })
            .collect())
    }

    fn minimum_balance_for_rent_exemption(&self, space: usize) -> FeeTokenResult<u64> {
        self.client
            .get_minimum_balance_for_rent_exemption(space)
            .map_err(|e| FeeTokenError::Rpc(e.to_string()))
    }
}

impl Faucet for RpcLedger {
    fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> FeeTokenResult<Signature> {
        let signature = self
            .client
            .request_airdrop(to, lamports)
            .map_err(|e| FeeTokenError::Rpc(format!("airdrop to {}: {}", to, e)))?;
        self.client
            .poll_for_signature(&signature)
            .map_err(|e| FeeTokenError::Rpc(format!("airdrop {} unconfirmed: {}", signature, e)))?;
        Ok(signature)
    }
}

/// Decode a Token-2022 account, reading its withheld transfer fees if any
pub fn decode_holder(address: Pubkey, data: &[u8]) -> Option<HolderAccount> {
    let state = StateWithExtensions::<Account>::unpack(data).ok()?;
    let withheld = state
        .get_extension::<TransferFeeAmount>()
        .map(|extension| u64::from(extension.withheld_amount))
        .unwrap_or(0);
    Some(HolderAccount {
        address,
        owner: state.base.owner,
        amount: state.base.amount,
        withheld,
    })
}
