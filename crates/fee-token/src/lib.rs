//! Transfer-fee Token-2022 launcher
//!
//! Fee policy and instruction sequencing for a mint carrying the transfer-fee
//! and metadata-pointer extensions. Planning is pure; signing, submission and
//! account queries go through [`KeyProvider`], [`LedgerSubmitter`] and
//! [`AccountReader`].

pub mod authority;
pub mod config;
pub mod error;
pub mod fee;
pub mod instructions;
pub mod keys;
pub mod launcher;
pub mod ledger;
pub mod metadata;
pub mod plan;
pub mod rpc;
pub mod space;
pub mod utils;

pub use authority::{Handoff, MintAuthority};
pub use config::{create_example_config, HandoffMode, LaunchConfig};
pub use error::{FeeTokenError, FeeTokenResult, SubmissionError};
pub use fee::{compute_fee, FeeQuote, TokenConfig, TransferRequest};
pub use keys::{EphemeralKeyProvider, FileKeyProvider, KeyProvider, KeyRole};
pub use launcher::{CreatedMint, HarvestReport, LaunchOptions, LaunchReport, TokenLauncher};
pub use ledger::{AccountReader, Faucet, HolderAccount, LedgerSubmitter};
pub use metadata::{MetadataRecord, MetadataSerializer, Token2022MetadataSerializer};
pub use plan::{
    plan_authority_handoff, plan_fee_harvest, plan_mint_supply, plan_token_creation,
    plan_transfer_with_fee, CreationPlan, CreationRequest, HarvestParties, HarvestStrategy,
    InstructionPlan, MintAuthorities, Operation, PlanStage, TransferParties,
};
pub use rpc::RpcLedger;
pub use space::{AccountSpace, MintExtension};
