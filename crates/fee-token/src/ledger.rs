//! Boundaries to the ledger
//!
//! The launcher only talks to the chain through these traits, so an
//! in-memory fake can stand in for a cluster in tests.

use solana_sdk::{pubkey::Pubkey, signature::Keypair, signature::Signature};

use crate::{
    error::{FeeTokenResult, SubmissionError},
    plan::InstructionPlan,
};

/// Signs and submits a plan as one transaction, waiting for confirmation.
/// Implementations must not retry on their own behalf.
pub trait LedgerSubmitter {
    fn submit(
        &self,
        plan: &InstructionPlan,
        signers: &[&Keypair],
    ) -> Result<Signature, SubmissionError>;
}

/// Token account as seen by the reader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HolderAccount {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    /// Transfer fees withheld on this account, awaiting harvest
    pub withheld: u64,
}

/// Read-only ledger queries
pub trait AccountReader {
    /// Every token account of `mint`
    fn token_accounts(&self, mint: &Pubkey) -> FeeTokenResult<Vec<HolderAccount>>;

    fn minimum_balance_for_rent_exemption(&self, space: usize) -> FeeTokenResult<u64>;
}

/// Funds an identity on test clusters
pub trait Faucet {
    fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> FeeTokenResult<Signature>;
}

/// Accounts with fees waiting to be harvested
pub fn withheld_accounts(accounts: &[HolderAccount]) -> Vec<Pubkey> {
    accounts
        .iter()
        .filter(|account| account.withheld > 0)
        .map(|account| account.address)
        .collect()
}

/// Sum of fees still withheld across `accounts`
pub fn total_withheld(accounts: &[HolderAccount]) -> u64 {
    accounts
        .iter()
        .fold(0u64, |sum, account| sum.saturating_add(account.withheld))
}
