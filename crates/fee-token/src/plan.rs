//! Instruction sequencing
//!
//! Each builder returns an [`InstructionPlan`]: an ordered, immutable list of
//! operations that one transaction submits atomically. Builders do no I/O;
//! anything that needs the ledger (rent, withheld balances) is passed in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::Instruction, message::Message, packet::PACKET_DATA_SIZE, pubkey::Pubkey,
    signature::Keypair, signer::Signer, transaction::Transaction,
};

use crate::{
    authority::{Handoff, MintAuthority},
    error::{FeeTokenError, FeeTokenResult},
    fee::{FeeQuote, TokenConfig, TransferRequest},
    instructions::{associated_token_address, build_instruction},
    metadata::{MetadataRecord, MetadataSerializer},
    space::{AccountSpace, MintExtension},
};

/// Token-2022 rejects withdraw/harvest instructions that overflow a transaction,
/// so sources are split into batches of at most this many accounts.
pub const DEFAULT_HARVEST_BATCH_SIZE: usize = 20;

/// Opaque operation descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateAccount {
        payer: Pubkey,
        account: Pubkey,
        lamports: u64,
        space: u64,
    },
    InitializeTransferFeeConfig {
        mint: Pubkey,
        config_authority: Option<Pubkey>,
        withdraw_authority: Option<Pubkey>,
        fee_basis_points: u16,
        maximum_fee: u64,
    },
    InitializeMetadataPointer {
        mint: Pubkey,
        authority: Option<Pubkey>,
        metadata_address: Option<Pubkey>,
    },
    InitializeMint {
        mint: Pubkey,
        decimals: u8,
        mint_authority: Pubkey,
        freeze_authority: Option<Pubkey>,
    },
    InitializeMetadata {
        mint: Pubkey,
        update_authority: Pubkey,
        mint_authority: Pubkey,
        name: String,
        symbol: String,
        uri: String,
    },
    UpdateMetadataField {
        mint: Pubkey,
        update_authority: Pubkey,
        key: String,
        value: String,
    },
    CreateAssociatedAccount {
        payer: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    },
    SetMintAuthority {
        mint: Pubkey,
        current: Pubkey,
        new_authority: Option<Pubkey>,
    },
    MintTo {
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
        amount: u64,
    },
    TransferCheckedWithFee {
        source: Pubkey,
        mint: Pubkey,
        destination: Pubkey,
        owner: Pubkey,
        amount: u64,
        decimals: u8,
        fee: u64,
    },
    HarvestWithheldToMint {
        mint: Pubkey,
        sources: Vec<Pubkey>,
    },
    WithdrawWithheldFromAccounts {
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
        sources: Vec<Pubkey>,
    },
    WithdrawWithheldFromMint {
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
    },
}

/// Position of an operation in the mint creation order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreationPhase {
    Allocate,
    ExtensionConfig,
    MintInit,
    MetadataWrite,
    PostCreation,
}

impl Operation {
    pub fn phase(&self) -> CreationPhase {
        match self {
            Operation::CreateAccount { .. } => CreationPhase::Allocate,
            Operation::InitializeTransferFeeConfig { .. }
            | Operation::InitializeMetadataPointer { .. } => CreationPhase::ExtensionConfig,
            Operation::InitializeMint { .. } => CreationPhase::MintInit,
            Operation::InitializeMetadata { .. } | Operation::UpdateMetadataField { .. } => {
                CreationPhase::MetadataWrite
            }
            _ => CreationPhase::PostCreation,
        }
    }

    /// Keys that must sign besides the fee payer
    pub fn signers(&self) -> Vec<Pubkey> {
        match self {
            Operation::CreateAccount { payer, account, .. } => vec![*payer, *account],
            Operation::InitializeMetadata { mint_authority, .. } => vec![*mint_authority],
            Operation::UpdateMetadataField {
                update_authority, ..
            } => vec![*update_authority],
            Operation::CreateAssociatedAccount { payer, .. } => vec![*payer],
            Operation::SetMintAuthority { current, .. } => vec![*current],
            Operation::MintTo { authority, .. } => vec![*authority],
            Operation::TransferCheckedWithFee { owner, .. } => vec![*owner],
            Operation::WithdrawWithheldFromAccounts { authority, .. }
            | Operation::WithdrawWithheldFromMint { authority, .. } => vec![*authority],
            Operation::InitializeTransferFeeConfig { .. }
            | Operation::InitializeMetadataPointer { .. }
            | Operation::InitializeMint { .. }
            | Operation::HarvestWithheldToMint { .. } => vec![],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateAccount { .. } => "create-account",
            Operation::InitializeTransferFeeConfig { .. } => "fee-config-init",
            Operation::InitializeMetadataPointer { .. } => "metadata-pointer-init",
            Operation::InitializeMint { .. } => "mint-init",
            Operation::InitializeMetadata { .. } => "metadata-init",
            Operation::UpdateMetadataField { .. } => "metadata-write",
            Operation::CreateAssociatedAccount { .. } => "create-associated-account",
            Operation::SetMintAuthority { .. } => "set-authority",
            Operation::MintTo { .. } => "mint-to",
            Operation::TransferCheckedWithFee { .. } => "transfer-with-fee",
            Operation::HarvestWithheldToMint { .. } => "harvest-withheld",
            Operation::WithdrawWithheldFromAccounts { .. } => "withdraw-withheld-accounts",
            Operation::WithdrawWithheldFromMint { .. } => "withdraw-withheld-mint",
        }
    }
}

/// Lifecycle stage a plan belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStage {
    Creation,
    /// Additional metadata fields written after creation
    Metadata,
    Mint,
    Transfer,
    Harvest,
    Handoff,
}

/// Ordered operations submitted as one transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionPlan {
    stage: PlanStage,
    fee_payer: Pubkey,
    operations: Vec<Operation>,
}

impl InstructionPlan {
    fn new(stage: PlanStage, fee_payer: Pubkey, operations: Vec<Operation>) -> Self {
        Self {
            stage,
            fee_payer,
            operations,
        }
    }

    pub fn stage(&self) -> PlanStage {
        self.stage
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.fee_payer
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fee payer first, then every operation's signers, deduplicated
    pub fn required_signers(&self) -> Vec<Pubkey> {
        let mut signers = vec![self.fee_payer];
        for key in self.operations.iter().flat_map(Operation::signers) {
            if !signers.contains(&key) {
                signers.push(key);
            }
        }
        signers
    }

    /// Fail before submission if a required signature is missing
    pub fn ensure_signers(&self, keypairs: &[&Keypair]) -> FeeTokenResult<()> {
        let provided: Vec<Pubkey> = keypairs.iter().map(|k| k.pubkey()).collect();
        match self
            .required_signers()
            .into_iter()
            .find(|key| !provided.contains(key))
        {
            Some(missing) => Err(FeeTokenError::MissingSigner(missing)),
            None => Ok(()),
        }
    }

    pub fn instructions(&self) -> FeeTokenResult<Vec<Instruction>> {
        self.operations.iter().map(build_instruction).collect()
    }

    /// Wire size of the signed transaction carrying this plan
    pub fn transaction_size(&self) -> FeeTokenResult<usize> {
        let message = Message::new(&self.instructions()?, Some(&self.fee_payer));
        // zeroed signature slots serialize to the same length as real ones
        let transaction = Transaction::new_unsigned(message);
        let size = bincode::serialized_size(&transaction)
            .map_err(|e| FeeTokenError::SerializationError(e.to_string()))?;
        Ok(size as usize)
    }

    /// Fail before submission if the plan does not fit in one packet
    pub fn ensure_fits(&self) -> FeeTokenResult<()> {
        let size = self.transaction_size()?;
        if size > PACKET_DATA_SIZE {
            return Err(FeeTokenError::TransactionTooLarge {
                size,
                limit: PACKET_DATA_SIZE,
            });
        }
        Ok(())
    }

    /// Allocation first, then extension config, mint init, metadata.
    /// Returns false for any plan the token program would reject for ordering.
    pub fn verify_creation_order(&self) -> bool {
        if self.operations.first().map(Operation::phase) != Some(CreationPhase::Allocate) {
            return false;
        }
        let phases: Vec<CreationPhase> = self.operations.iter().map(Operation::phase).collect();
        let monotonic = phases.windows(2).all(|w| w[0] <= w[1]);
        let allocations = phases
            .iter()
            .filter(|p| **p == CreationPhase::Allocate)
            .count();
        let mint_inits = phases
            .iter()
            .filter(|p| **p == CreationPhase::MintInit)
            .count();
        monotonic && allocations == 1 && mint_inits == 1
    }
}

/// Keys configured on the mint at creation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintAuthorities {
    pub mint_authority: Pubkey,
    pub freeze_authority: Option<Pubkey>,
    pub transfer_fee_config_authority: Pubkey,
    pub withdraw_withheld_authority: Pubkey,
    /// Also the metadata pointer authority
    pub metadata_update_authority: Pubkey,
}

/// Everything needed to plan a new mint
#[derive(Clone, Debug)]
pub struct CreationRequest<'a> {
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub authorities: MintAuthorities,
    pub extensions: &'a [MintExtension],
    pub metadata: Option<&'a MetadataRecord>,
}

/// Creation plan plus the space it reserved
#[derive(Clone, Debug)]
pub struct CreationPlan {
    pub plan: InstructionPlan,
    /// Additional metadata field writes, submitted in order after `plan`
    pub metadata_fields: Vec<InstructionPlan>,
    pub space: AccountSpace,
    pub lamports: u64,
}

/// Plan the transaction that allocates and initializes a mint, followed by
/// the transactions that write its additional metadata fields.
///
/// The metadata payload is serialized once here to size the account. The
/// create-account op allocates only the fixed part; the lamports cover the
/// metadata too, since the token program grows the account when metadata is
/// initialized or a field is added. Every returned plan fits in one packet.
pub fn plan_token_creation<S, F>(
    config: &TokenConfig,
    request: &CreationRequest<'_>,
    serializer: &S,
    lamports_for: F,
) -> FeeTokenResult<CreationPlan>
where
    S: MetadataSerializer + ?Sized,
    F: FnOnce(usize) -> FeeTokenResult<u64>,
{
    let extensions: BTreeSet<MintExtension> = request.extensions.iter().copied().collect();
    let extensions: Vec<MintExtension> = extensions.into_iter().collect();

    let payload_len = match request.metadata {
        Some(record) => {
            if !extensions.contains(&MintExtension::MetadataPointer) {
                return Err(FeeTokenError::InvalidParameters(
                    "metadata requires the metadata pointer extension".into(),
                ));
            }
            record.validate()?;
            serializer.serialize(record, &request.mint)?.len()
        }
        None => 0,
    };

    let space = AccountSpace::calculate(&extensions, payload_len)?;
    let lamports = lamports_for(space.total())?;
    let authorities = &request.authorities;

    let mut operations = vec![Operation::CreateAccount {
        payer: request.payer,
        account: request.mint,
        lamports,
        space: space.mint_len as u64,
    }];

    for extension in &extensions {
        operations.push(match extension {
            MintExtension::TransferFee => Operation::InitializeTransferFeeConfig {
                mint: request.mint,
                config_authority: Some(authorities.transfer_fee_config_authority),
                withdraw_authority: Some(authorities.withdraw_withheld_authority),
                fee_basis_points: config.fee_basis_points(),
                maximum_fee: config.maximum_fee(),
            },
            MintExtension::MetadataPointer => Operation::InitializeMetadataPointer {
                mint: request.mint,
                authority: Some(authorities.metadata_update_authority),
                metadata_address: Some(request.mint),
            },
        });
    }

    operations.push(Operation::InitializeMint {
        mint: request.mint,
        decimals: config.decimals(),
        mint_authority: authorities.mint_authority,
        freeze_authority: authorities.freeze_authority,
    });

    if let Some(record) = request.metadata {
        operations.push(Operation::InitializeMetadata {
            mint: request.mint,
            update_authority: authorities.metadata_update_authority,
            mint_authority: authorities.mint_authority,
            name: record.name.clone(),
            symbol: record.symbol.clone(),
            uri: record.uri.clone(),
        });
    }

    let plan = InstructionPlan::new(PlanStage::Creation, request.payer, operations);
    debug_assert!(plan.verify_creation_order());
    plan.ensure_fits()?;

    let field_updates: Vec<Operation> = request
        .metadata
        .map(|record| {
            record
                .additional
                .iter()
                .map(|(key, value)| Operation::UpdateMetadataField {
                    mint: request.mint,
                    update_authority: authorities.metadata_update_authority,
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    let metadata_fields = pack_into_packets(PlanStage::Metadata, request.payer, field_updates)?;

    Ok(CreationPlan {
        plan,
        metadata_fields,
        space,
        lamports,
    })
}

/// Split `operations` into consecutive plans that each fit in one packet
fn pack_into_packets(
    stage: PlanStage,
    fee_payer: Pubkey,
    operations: Vec<Operation>,
) -> FeeTokenResult<Vec<InstructionPlan>> {
    let mut plans = Vec::new();
    let mut current: Vec<Operation> = Vec::new();

    for operation in operations {
        let mut candidate = current.clone();
        candidate.push(operation.clone());
        let size = InstructionPlan::new(stage, fee_payer, candidate.clone()).transaction_size()?;
        if size <= PACKET_DATA_SIZE {
            current = candidate;
            continue;
        }
        if current.is_empty() {
            return Err(FeeTokenError::TransactionTooLarge {
                size,
                limit: PACKET_DATA_SIZE,
            });
        }
        plans.push(InstructionPlan::new(
            stage,
            fee_payer,
            std::mem::take(&mut current),
        ));
        // a lone operation may still be too large
        let alone = InstructionPlan::new(stage, fee_payer, vec![operation]);
        alone.ensure_fits()?;
        current = alone.operations;
    }

    if !current.is_empty() {
        plans.push(InstructionPlan::new(stage, fee_payer, current));
    }
    Ok(plans)
}

/// Create the owner's token account and mint the configured supply into it
pub fn plan_mint_supply(
    config: &TokenConfig,
    payer: Pubkey,
    mint: Pubkey,
    owner: Pubkey,
    mint_authority: Pubkey,
) -> InstructionPlan {
    InstructionPlan::new(
        PlanStage::Mint,
        payer,
        vec![
            Operation::CreateAssociatedAccount { payer, owner, mint },
            Operation::MintTo {
                mint,
                destination: associated_token_address(&owner, &mint),
                authority: mint_authority,
                amount: config.mint_supply(),
            },
        ],
    )
}

/// Parties to a transfer; token accounts are the owners' associated accounts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferParties {
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub source_owner: Pubkey,
    pub destination_owner: Pubkey,
}

/// Quote the fee and plan a checked transfer that asserts it.
///
/// The quote is passed through as-is; if the on-chain fee config disagrees
/// the token program rejects the transfer.
pub fn plan_transfer_with_fee(
    config: &TokenConfig,
    request: TransferRequest,
    parties: &TransferParties,
) -> (InstructionPlan, FeeQuote) {
    let amount = request.amount;
    let quote = request.quote(config);
    let mint = parties.mint;

    let plan = InstructionPlan::new(
        PlanStage::Transfer,
        parties.payer,
        vec![
            Operation::CreateAssociatedAccount {
                payer: parties.payer,
                owner: parties.destination_owner,
                mint,
            },
            Operation::TransferCheckedWithFee {
                source: associated_token_address(&parties.source_owner, &mint),
                mint,
                destination: associated_token_address(&parties.destination_owner, &mint),
                owner: parties.source_owner,
                amount,
                decimals: config.decimals(),
                fee: quote.fee(),
            },
        ],
    );
    (plan, quote)
}

/// Where withheld fees are collected from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarvestStrategy {
    /// Withdraw straight from holder accounts to the vault
    #[default]
    WithdrawFromAccounts,
    /// Harvest holder accounts into the mint, then withdraw from the mint
    HarvestToMint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarvestParties {
    pub payer: Pubkey,
    pub mint: Pubkey,
    pub withdraw_authority: Pubkey,
    pub vault_owner: Pubkey,
}

/// One plan per transaction, in submission order
pub fn plan_fee_harvest(
    strategy: HarvestStrategy,
    parties: &HarvestParties,
    sources: &[Pubkey],
    batch_size: usize,
) -> FeeTokenResult<Vec<InstructionPlan>> {
    if batch_size == 0 {
        return Err(FeeTokenError::InvalidParameters(
            "harvest batch size must be greater than 0".into(),
        ));
    }

    let mint = parties.mint;
    let create_vault = Operation::CreateAssociatedAccount {
        payer: parties.payer,
        owner: parties.vault_owner,
        mint,
    };
    let vault = associated_token_address(&parties.vault_owner, &mint);
    let new_plan = |operations| InstructionPlan::new(PlanStage::Harvest, parties.payer, operations);

    let plans = match strategy {
        HarvestStrategy::WithdrawFromAccounts => sources
            .chunks(batch_size)
            .enumerate()
            .map(|(i, chunk)| {
                let withdraw = Operation::WithdrawWithheldFromAccounts {
                    mint,
                    destination: vault,
                    authority: parties.withdraw_authority,
                    sources: chunk.to_vec(),
                };
                if i == 0 {
                    new_plan(vec![create_vault.clone(), withdraw])
                } else {
                    new_plan(vec![withdraw])
                }
            })
            .collect(),
        HarvestStrategy::HarvestToMint => {
            let mut plans: Vec<InstructionPlan> = sources
                .chunks(batch_size)
                .map(|chunk| {
                    new_plan(vec![Operation::HarvestWithheldToMint {
                        mint,
                        sources: chunk.to_vec(),
                    }])
                })
                .collect();
            plans.push(new_plan(vec![
                create_vault,
                Operation::WithdrawWithheldFromMint {
                    mint,
                    destination: vault,
                    authority: parties.withdraw_authority,
                },
            ]));
            plans
        }
    };
    Ok(plans)
}

/// Move or revoke the mint authority. Returns the plan and the resulting state.
pub fn plan_authority_handoff(
    payer: Pubkey,
    mint: Pubkey,
    current: &MintAuthority,
    handoff: Handoff,
) -> FeeTokenResult<(InstructionPlan, MintAuthority)> {
    let holder = current.holder().ok_or(FeeTokenError::AuthorityRevoked)?;
    let next = current.apply(handoff)?;

    let plan = InstructionPlan::new(
        PlanStage::Handoff,
        payer,
        vec![Operation::SetMintAuthority {
            mint,
            current: holder,
            new_authority: next.holder(),
        }],
    );
    Ok((plan, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Token2022MetadataSerializer;

    const TOKEN: u64 = 1_000_000_000;

    fn token_config() -> TokenConfig {
        TokenConfig::new(9, 100, 9 * TOKEN, 1_000_000 * TOKEN).unwrap()
    }

    fn authorities() -> MintAuthorities {
        MintAuthorities {
            mint_authority: Pubkey::new_unique(),
            freeze_authority: None,
            transfer_fee_config_authority: Pubkey::new_unique(),
            withdraw_withheld_authority: Pubkey::new_unique(),
            metadata_update_authority: Pubkey::new_unique(),
        }
    }

    fn record() -> MetadataRecord {
        MetadataRecord::new("Frog Wif Cat", "FWC", "https://example.com/fwc.json")
            .with_field("chain", "solana")
            .with_field("website", "frog.cat")
    }

    fn creation(metadata: Option<&MetadataRecord>) -> CreationPlan {
        let request = CreationRequest {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            authorities: authorities(),
            // listed out of order and duplicated on purpose
            extensions: &[
                MintExtension::MetadataPointer,
                MintExtension::TransferFee,
                MintExtension::MetadataPointer,
            ],
            metadata,
        };
        plan_token_creation(
            &token_config(),
            &request,
            &Token2022MetadataSerializer,
            |len| Ok(len as u64 * 10),
        )
        .unwrap()
    }

    #[test]
    fn test_creation_order() {
        let record = record();
        let created = creation(Some(&record));
        let names: Vec<&str> = created.plan.operations().iter().map(Operation::name).collect();
        assert_eq!(
            names,
            vec![
                "create-account",
                "fee-config-init",
                "metadata-pointer-init",
                "mint-init",
                "metadata-init",
            ]
        );
        assert!(created.plan.verify_creation_order());

        // both additional fields fit in one follow-up transaction
        assert_eq!(created.metadata_fields.len(), 1);
        let fields = &created.metadata_fields[0];
        assert_eq!(fields.stage(), PlanStage::Metadata);
        assert!(fields
            .operations()
            .iter()
            .all(|op| op.name() == "metadata-write"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_many_fields_stay_within_packet_limit() {
        let record = MetadataRecord::new(
            "Frog Wif Cat",
            "FWC",
            format!("https://{}", "a".repeat(192)),
        )
        .with_field("website", "https://frogwifcat.example.com")
        .with_field("twitter", "https://twitter.com/frogwifcat")
        .with_field("telegram", "https://t.me/frogwifcat")
        .with_field("discord", "https://discord.gg/frogwifcat")
        .with_field("github", "https://github.com/frogwifcat/frogwifcat");
        assert!(record.validate().is_ok());

        let created = creation(Some(&record));
        assert!(created.plan.transaction_size().unwrap() <= PACKET_DATA_SIZE);
        for plan in &created.metadata_fields {
            assert!(plan.transaction_size().unwrap() <= PACKET_DATA_SIZE);
            assert_eq!(plan.required_signers().len(), 2);
        }

        let keys: Vec<String> = created
            .metadata_fields
            .iter()
            .flat_map(|p| p.operations())
            .filter_map(|op| match op {
                Operation::UpdateMetadataField { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = record.additional.keys().cloned().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_field_too_large_for_any_transaction() {
        let record = record().with_field("description", "x".repeat(1_300));
        let request = CreationRequest {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            authorities: authorities(),
            extensions: &[MintExtension::TransferFee, MintExtension::MetadataPointer],
            metadata: Some(&record),
        };
        let result = plan_token_creation(
            &token_config(),
            &request,
            &Token2022MetadataSerializer,
            |_| Ok(0),
        );
        assert!(matches!(
            result,
            Err(FeeTokenError::TransactionTooLarge { limit, .. }) if limit == PACKET_DATA_SIZE
        ));
    }

    #[test]
    fn test_oversized_plan_rejected() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let writes = (0..20)
            .map(|i| Operation::UpdateMetadataField {
                mint,
                update_authority: payer,
                key: format!("field-{}", i),
                value: "v".repeat(64),
            })
            .collect();
        let plan = InstructionPlan::new(PlanStage::Metadata, payer, writes);
        assert!(plan.transaction_size().unwrap() > PACKET_DATA_SIZE);
        assert!(matches!(
            plan.ensure_fits(),
            Err(FeeTokenError::TransactionTooLarge { .. })
        ));
    }

    #[test]
    fn test_creation_reserves_metadata_space() {
        let record = record();
        let created = creation(Some(&record));

        match &created.plan.operations()[0] {
            Operation::CreateAccount {
                space, lamports, ..
            } => {
                assert_eq!(*space as usize, created.space.mint_len);
                assert_eq!(*lamports, created.space.total() as u64 * 10);
            }
            other => panic!("expected create-account, got {:?}", other),
        }
        assert!(created.space.metadata_len > 0);
        assert_eq!(created.lamports, created.space.total() as u64 * 10);
    }

    #[test]
    fn test_creation_carries_fee_config() {
        let created = creation(None);
        let fee_config = created
            .plan
            .operations()
            .iter()
            .find_map(|op| match op {
                Operation::InitializeTransferFeeConfig {
                    fee_basis_points,
                    maximum_fee,
                    ..
                } => Some((*fee_basis_points, *maximum_fee)),
                _ => None,
            })
            .unwrap();
        assert_eq!(fee_config, (100, 9 * TOKEN));
        assert_eq!(created.space.metadata_len, 0);
        assert!(created.plan.verify_creation_order());
    }

    #[test]
    fn test_metadata_without_pointer_is_rejected() {
        let record = record();
        let request = CreationRequest {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            authorities: authorities(),
            extensions: &[MintExtension::TransferFee],
            metadata: Some(&record),
        };
        let result = plan_token_creation(
            &token_config(),
            &request,
            &Token2022MetadataSerializer,
            |_| Ok(0),
        );
        assert!(matches!(result, Err(FeeTokenError::InvalidParameters(_))));
    }

    #[test]
    fn test_invalid_metadata_fails_before_planning() {
        let mut record = record();
        record.symbol = String::new();
        let request = CreationRequest {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            authorities: authorities(),
            extensions: &[MintExtension::MetadataPointer],
            metadata: Some(&record),
        };
        let result = plan_token_creation(
            &token_config(),
            &request,
            &Token2022MetadataSerializer,
            |_| panic!("rent should not be queried"),
        );
        assert!(matches!(result, Err(FeeTokenError::InvalidMetadata(_))));
    }

    #[test]
    fn test_verify_creation_order_rejects_bad_plans() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mint_init = Operation::InitializeMint {
            mint,
            decimals: 9,
            mint_authority: payer,
            freeze_authority: None,
        };
        let alloc = Operation::CreateAccount {
            payer,
            account: mint,
            lamports: 1,
            space: 82,
        };
        let pointer = Operation::InitializeMetadataPointer {
            mint,
            authority: None,
            metadata_address: Some(mint),
        };
        let write = Operation::InitializeMetadata {
            mint,
            update_authority: payer,
            mint_authority: payer,
            name: "a".into(),
            symbol: "A".into(),
            uri: String::new(),
        };

        let plan = |ops| InstructionPlan::new(PlanStage::Creation, payer, ops);
        assert!(plan(vec![alloc.clone(), pointer.clone(), mint_init.clone()]).verify_creation_order());
        assert!(!plan(vec![pointer.clone(), alloc.clone(), mint_init.clone()]).verify_creation_order());
        assert!(!plan(vec![alloc.clone(), mint_init.clone(), pointer]).verify_creation_order());
        assert!(!plan(vec![alloc.clone(), write, mint_init.clone()]).verify_creation_order());
        assert!(!plan(vec![alloc]).verify_creation_order());
    }

    #[test]
    fn test_creation_signers() {
        let record = record();
        let created = creation(Some(&record));
        let signers = created.plan.required_signers();
        let payer = created.plan.fee_payer();
        let mint = match &created.plan.operations()[0] {
            Operation::CreateAccount { account, .. } => *account,
            _ => unreachable!(),
        };
        assert_eq!(signers[0], payer);
        assert!(signers.contains(&mint));
        // plus the mint authority, which signs metadata init
        assert_eq!(signers.len(), 3);

        let payer_key = Keypair::new();
        assert!(matches!(
            created.plan.ensure_signers(&[&payer_key]),
            Err(FeeTokenError::MissingSigner(_))
        ));
    }

    #[test]
    fn test_transfer_uses_quoted_fee() {
        let parties = TransferParties {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            source_owner: Pubkey::new_unique(),
            destination_owner: Pubkey::new_unique(),
        };
        let (plan, quote) =
            plan_transfer_with_fee(&token_config(), TransferRequest::new(1_000 * TOKEN), &parties);
        assert_eq!(quote.fee(), 9 * TOKEN);
        assert_eq!(plan.stage(), PlanStage::Transfer);

        match &plan.operations()[1] {
            Operation::TransferCheckedWithFee {
                amount,
                decimals,
                fee,
                owner,
                source,
                destination,
                ..
            } => {
                assert_eq!(*amount, 1_000 * TOKEN);
                assert_eq!(*decimals, 9);
                assert_eq!(*fee, quote.fee());
                assert_eq!(*owner, parties.source_owner);
                assert_eq!(
                    *source,
                    associated_token_address(&parties.source_owner, &parties.mint)
                );
                assert_eq!(
                    *destination,
                    associated_token_address(&parties.destination_owner, &parties.mint)
                );
            }
            other => panic!("expected transfer, got {:?}", other),
        }
        assert_eq!(plan.required_signers(), vec![parties.payer, parties.source_owner]);
    }

    #[test]
    fn test_mint_supply_plan() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let plan = plan_mint_supply(&token_config(), payer, mint, owner, authority);
        assert_eq!(
            plan.operations()[1],
            Operation::MintTo {
                mint,
                destination: associated_token_address(&owner, &mint),
                authority,
                amount: 1_000_000 * TOKEN,
            }
        );
        assert_eq!(plan.required_signers(), vec![payer, authority]);
    }

    fn harvest_parties() -> HarvestParties {
        HarvestParties {
            payer: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            withdraw_authority: Pubkey::new_unique(),
            vault_owner: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_withdraw_from_accounts_batches() {
        let parties = harvest_parties();
        let sources: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        let plans = plan_fee_harvest(HarvestStrategy::WithdrawFromAccounts, &parties, &sources, 2)
            .unwrap();

        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].operations()[0].name(), "create-associated-account");
        assert_eq!(plans[0].len(), 2);
        assert_eq!(plans[1].len(), 1);
        let batched: Vec<Pubkey> = plans
            .iter()
            .flat_map(|p| p.operations())
            .filter_map(|op| match op {
                Operation::WithdrawWithheldFromAccounts { sources, .. } => Some(sources.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(batched, sources);
    }

    #[test]
    fn test_withdraw_from_accounts_nothing_withheld() {
        let plans =
            plan_fee_harvest(HarvestStrategy::WithdrawFromAccounts, &harvest_parties(), &[], 20)
                .unwrap();
        assert!(plans.is_empty());
    }

    #[test]
    fn test_harvest_to_mint_ends_with_withdraw() {
        let parties = harvest_parties();
        let sources: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
        let plans =
            plan_fee_harvest(HarvestStrategy::HarvestToMint, &parties, &sources, 20).unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].operations()[0].name(), "harvest-withheld");
        assert_eq!(plans[0].required_signers(), vec![parties.payer]);
        let last = plans.last().unwrap();
        assert_eq!(last.operations()[1].name(), "withdraw-withheld-mint");
        assert!(last.required_signers().contains(&parties.withdraw_authority));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(
            plan_fee_harvest(HarvestStrategy::HarvestToMint, &harvest_parties(), &[], 0).is_err()
        );
    }

    #[test]
    fn test_authority_handoff_then_revoke() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let original = Pubkey::new_unique();
        let next = Pubkey::new_unique();

        let (plan, state) = plan_authority_handoff(
            payer,
            mint,
            &MintAuthority::Present(original),
            Handoff::TransferTo(next),
        )
        .unwrap();
        assert_eq!(
            plan.operations(),
            &[Operation::SetMintAuthority {
                mint,
                current: original,
                new_authority: Some(next),
            }]
        );
        assert_eq!(state, MintAuthority::Transferred(next));

        let (plan, state) = plan_authority_handoff(payer, mint, &state, Handoff::Revoke).unwrap();
        assert_eq!(
            plan.operations()[0],
            Operation::SetMintAuthority {
                mint,
                current: next,
                new_authority: None,
            }
        );
        assert!(state.is_revoked());

        assert!(matches!(
            plan_authority_handoff(payer, mint, &state, Handoff::Revoke),
            Err(FeeTokenError::AuthorityRevoked)
        ));
    }

    #[test]
    fn test_plans_build_instructions() {
        let record = record();
        let created = creation(Some(&record));
        let instructions = created.plan.instructions().unwrap();
        assert_eq!(instructions.len(), created.plan.len());
        assert_eq!(instructions[0].program_id, solana_sdk::system_program::id());
        assert!(instructions[1..]
            .iter()
            .all(|ix| ix.program_id == spl_token_2022::id()));
    }
}
