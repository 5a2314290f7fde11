//! Token lifecycle orchestration
//!
//! Runs each stage and waits for it before planning the next: create the
//! mint and write its extra metadata fields, mint the supply, transfer with a
//! fee, harvest what the transfer withheld, then hand off the mint authority. The first failure
//! stops the run and is returned as-is.

use std::sync::Arc;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::{debug, info, warn};

use crate::{
    authority::{Handoff, MintAuthority},
    config::LaunchConfig,
    error::FeeTokenResult,
    fee::{FeeQuote, TokenConfig, TransferRequest},
    keys::{KeyProvider, KeyRole},
    ledger::{total_withheld, withheld_accounts, AccountReader, Faucet, LedgerSubmitter},
    metadata::{MetadataRecord, Token2022MetadataSerializer},
    plan::{
        plan_authority_handoff, plan_fee_harvest, plan_mint_supply, plan_token_creation,
        plan_transfer_with_fee, CreationRequest, HarvestParties, HarvestStrategy, InstructionPlan,
        MintAuthorities, TransferParties,
    },
    space::{AccountSpace, MintExtension},
};

/// What to launch
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub token: TokenConfig,
    /// Base units sent from the owner to the recipient
    pub transfer_amount: u64,
    pub extensions: Vec<MintExtension>,
    pub metadata: Option<MetadataRecord>,
    pub harvest_strategy: HarvestStrategy,
    pub harvest_batch_size: usize,
    pub handoff: Option<Handoff>,
}

impl LaunchOptions {
    pub fn from_config(config: &LaunchConfig) -> FeeTokenResult<Self> {
        Ok(Self {
            token: config.token_config()?,
            transfer_amount: config.transfer_amount()?,
            extensions: config.extensions(),
            metadata: config.metadata.clone(),
            harvest_strategy: config.harvest.strategy,
            harvest_batch_size: config.harvest.batch_size,
            handoff: config.handoff()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedMint {
    pub mint: Pubkey,
    pub signature: Signature,
    /// Additional metadata field writes
    pub metadata_fields: Vec<Signature>,
    pub space: AccountSpace,
    pub lamports: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Accounts that had fees withheld when the harvest was planned
    pub sources: Vec<Pubkey>,
    pub withheld: u64,
    pub signatures: Vec<Signature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchReport {
    pub created: CreatedMint,
    pub mint_supply: Signature,
    pub transfer: Signature,
    pub quote: FeeQuote,
    pub harvest: HarvestReport,
    pub handoff: Option<Signature>,
    pub authority: MintAuthority,
}

impl LaunchReport {
    pub fn mint(&self) -> Pubkey {
        self.created.mint
    }

    /// Every confirmed transaction in submission order
    pub fn signatures(&self) -> Vec<Signature> {
        let mut signatures = vec![self.created.signature];
        signatures.extend(self.created.metadata_fields.iter().copied());
        signatures.extend([self.mint_supply, self.transfer]);
        signatures.extend(self.harvest.signatures.iter().copied());
        signatures.extend(self.handoff);
        signatures
    }
}

pub struct TokenLauncher<'a, K, L> {
    keys: &'a mut K,
    ledger: &'a L,
    options: LaunchOptions,
}

impl<'a, K, L> TokenLauncher<'a, K, L>
where
    K: KeyProvider,
    L: LedgerSubmitter + AccountReader,
{
    pub fn new(keys: &'a mut K, ledger: &'a L, options: LaunchOptions) -> Self {
        Self {
            keys,
            ledger,
            options,
        }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    fn pubkey(&mut self, role: KeyRole) -> FeeTokenResult<Pubkey> {
        Ok(self.keys.keypair(role)?.pubkey())
    }

    /// Airdrop `lamports` to the payer. Zero skips the request.
    pub fn fund<F>(&mut self, faucet: &F, lamports: u64) -> FeeTokenResult<Option<Signature>>
    where
        F: Faucet + ?Sized,
    {
        if lamports == 0 {
            debug!("Airdrop disabled");
            return Ok(None);
        }
        let payer = self.pubkey(KeyRole::Payer)?;
        let signature = faucet.request_airdrop(&payer, lamports)?;
        info!("Airdropped {} lamports to {}: {}", lamports, payer, signature);
        Ok(Some(signature))
    }

    /// Sign `plan` with the keys of `roles` it needs and submit it once
    fn submit(&mut self, plan: &InstructionPlan, roles: &[KeyRole]) -> FeeTokenResult<Signature> {
        let required = plan.required_signers();
        let mut keypairs: Vec<Arc<Keypair>> = Vec::with_capacity(required.len());
        for role in roles {
            let keypair = self.keys.keypair(*role)?;
            let pubkey = keypair.pubkey();
            if required.contains(&pubkey) && !keypairs.iter().any(|k| k.pubkey() == pubkey) {
                keypairs.push(keypair);
            }
        }
        let signers: Vec<&Keypair> = keypairs.iter().map(|k| k.as_ref()).collect();
        plan.ensure_signers(&signers)?;
        plan.ensure_fits()?;

        debug!(
            "Submitting {:?} plan: {} operations, {} signers",
            plan.stage(),
            plan.len(),
            signers.len()
        );
        match self.ledger.submit(plan, &signers) {
            Ok(signature) => {
                info!("{:?} confirmed: {}", plan.stage(), signature);
                Ok(signature)
            }
            Err(e) => {
                warn!("{:?} failed: {}", plan.stage(), e);
                Err(e.into())
            }
        }
    }

    /// Allocate and initialize the mint with its extensions and metadata
    pub fn create_mint(&mut self) -> FeeTokenResult<CreatedMint> {
        let payer = self.pubkey(KeyRole::Payer)?;
        let mint = self.pubkey(KeyRole::Mint)?;
        let authorities = MintAuthorities {
            mint_authority: self.pubkey(KeyRole::MintAuthority)?,
            freeze_authority: None,
            transfer_fee_config_authority: self.pubkey(KeyRole::TransferFeeConfigAuthority)?,
            withdraw_withheld_authority: self.pubkey(KeyRole::WithdrawWithheldAuthority)?,
            metadata_update_authority: self.pubkey(KeyRole::MetadataUpdateAuthority)?,
        };

        let request = CreationRequest {
            payer,
            mint,
            authorities,
            extensions: &self.options.extensions,
            metadata: self.options.metadata.as_ref(),
        };
        let ledger = self.ledger;
        let created = plan_token_creation(
            &self.options.token,
            &request,
            &Token2022MetadataSerializer,
            |space| ledger.minimum_balance_for_rent_exemption(space),
        )?;
        info!(
            "Creating mint {}: {} bytes allocated, {} bytes of metadata, {} lamports",
            mint, created.space.mint_len, created.space.metadata_len, created.lamports
        );

        let signature = self.submit(
            &created.plan,
            &[
                KeyRole::Payer,
                KeyRole::Mint,
                KeyRole::MintAuthority,
                KeyRole::MetadataUpdateAuthority,
            ],
        )?;

        let mut metadata_fields = Vec::with_capacity(created.metadata_fields.len());
        for plan in &created.metadata_fields {
            debug!("Writing {} metadata fields", plan.len());
            metadata_fields
                .push(self.submit(plan, &[KeyRole::Payer, KeyRole::MetadataUpdateAuthority])?);
        }

        Ok(CreatedMint {
            mint,
            signature,
            metadata_fields,
            space: created.space,
            lamports: created.lamports,
        })
    }

    /// Mint the configured supply to the owner's token account
    pub fn mint_supply(&mut self, mint: Pubkey) -> FeeTokenResult<Signature> {
        let payer = self.pubkey(KeyRole::Payer)?;
        let owner = self.pubkey(KeyRole::Owner)?;
        let mint_authority = self.pubkey(KeyRole::MintAuthority)?;
        let plan = plan_mint_supply(&self.options.token, payer, mint, owner, mint_authority);
        info!("Minting {} base units", self.options.token.mint_supply());
        self.submit(&plan, &[KeyRole::Payer, KeyRole::MintAuthority])
    }

    /// Transfer from the owner to the recipient, asserting the quoted fee
    pub fn transfer(&mut self, mint: Pubkey) -> FeeTokenResult<(Signature, FeeQuote)> {
        let parties = TransferParties {
            payer: self.pubkey(KeyRole::Payer)?,
            mint,
            source_owner: self.pubkey(KeyRole::Owner)?,
            destination_owner: self.pubkey(KeyRole::Recipient)?,
        };
        let (plan, quote) = plan_transfer_with_fee(
            &self.options.token,
            TransferRequest::new(self.options.transfer_amount),
            &parties,
        );
        info!(
            "Transferring {} base units, fee {}",
            self.options.transfer_amount,
            quote.fee()
        );
        let signature = self.submit(&plan, &[KeyRole::Payer, KeyRole::Owner])?;
        Ok((signature, quote))
    }

    /// Collect withheld fees of `mint` into the fee vault
    pub fn harvest(&mut self, mint: Pubkey) -> FeeTokenResult<HarvestReport> {
        let accounts = self.ledger.token_accounts(&mint)?;
        let sources = withheld_accounts(&accounts);
        let withheld = total_withheld(&accounts);
        info!(
            "{} of {} token accounts hold {} withheld",
            sources.len(),
            accounts.len(),
            withheld
        );

        let parties = HarvestParties {
            payer: self.pubkey(KeyRole::Payer)?,
            mint,
            withdraw_authority: self.pubkey(KeyRole::WithdrawWithheldAuthority)?,
            vault_owner: self.pubkey(KeyRole::FeeVault)?,
        };
        let plans = plan_fee_harvest(
            self.options.harvest_strategy,
            &parties,
            &sources,
            self.options.harvest_batch_size,
        )?;

        let mut signatures = Vec::with_capacity(plans.len());
        for (i, plan) in plans.iter().enumerate() {
            debug!("Harvest batch {}/{}", i + 1, plans.len());
            signatures.push(self.submit(plan, &[KeyRole::Payer, KeyRole::WithdrawWithheldAuthority])?);
        }
        Ok(HarvestReport {
            sources,
            withheld,
            signatures,
        })
    }

    /// Move or revoke the mint authority. Only keys held by this provider can sign.
    pub fn handoff(
        &mut self,
        mint: Pubkey,
        current: &MintAuthority,
        handoff: Handoff,
    ) -> FeeTokenResult<(Signature, MintAuthority)> {
        let payer = self.pubkey(KeyRole::Payer)?;
        let (plan, next) = plan_authority_handoff(payer, mint, current, handoff)?;
        info!("Mint authority {:?} -> {:?}", current, next);
        let signature = self.submit(&plan, &[KeyRole::Payer, KeyRole::MintAuthority])?;
        Ok((signature, next))
    }

    /// Run every stage in order
    pub fn launch(&mut self) -> FeeTokenResult<LaunchReport> {
        let created = self.create_mint()?;
        let mint = created.mint;
        let mint_supply = self.mint_supply(mint)?;
        let (transfer, quote) = self.transfer(mint)?;
        let harvest = self.harvest(mint)?;

        let mut authority = MintAuthority::Present(self.pubkey(KeyRole::MintAuthority)?);
        let handoff = match self.options.handoff {
            Some(handoff) => {
                let (signature, next) = self.handoff(mint, &authority, handoff)?;
                authority = next;
                Some(signature)
            }
            None => None,
        };

        Ok(LaunchReport {
            created,
            mint_supply,
            transfer,
            quote,
            harvest,
            handoff,
            authority,
        })
    }
}
