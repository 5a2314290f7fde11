// Launch and harvest commands

use anyhow::{Context, Result};
use fee_token::{
    keys::expand_home, utils::explorer_url, utils::format_amount, EphemeralKeyProvider,
    FileKeyProvider, KeyProvider, LaunchConfig, LaunchOptions, RpcLedger, TokenLauncher,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use super::utils::{info, load_config, parse_pubkey, success, warn};

fn connect(config: &LaunchConfig) -> Result<RpcLedger> {
    let commitment = config.commitment()?;
    info(&format!("Connecting to {}", config.cluster.rpc_url));
    Ok(RpcLedger::new(config.cluster.rpc_url.clone(), commitment))
}

fn file_keys(config: &LaunchConfig) -> Result<FileKeyProvider> {
    let directory = expand_home(&config.keys.directory)?;
    info(&format!("Using keys in {}", directory.display()));
    FileKeyProvider::new(&directory)
        .with_context(|| format!("Failed to open key directory {}", directory.display()))
}

fn print_signature(label: &str, signature: &Signature, config: &LaunchConfig) {
    println!(
        "  {:<10} {}",
        label,
        explorer_url(
            signature,
            &config.cluster.explorer_cluster,
            &config.cluster.rpc_url
        )
    );
}

pub fn execute(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let ledger = connect(&config)?;

    if config.keys.persist {
        launch(&config, &ledger, &mut file_keys(&config)?)
    } else {
        warn("Keys are ephemeral; the mint authority is lost when this run ends");
        launch(&config, &ledger, &mut EphemeralKeyProvider::new())
    }
}

fn launch<K: KeyProvider>(config: &LaunchConfig, ledger: &RpcLedger, keys: &mut K) -> Result<()> {
    let options = LaunchOptions::from_config(config)?;
    let decimals = options.token.decimals();
    let mut launcher = TokenLauncher::new(keys, ledger, options);

    if let Some(signature) = launcher
        .fund(ledger, config.cluster.airdrop_lamports)
        .context("Airdrop failed")?
    {
        print_signature("airdrop", &signature, config);
    }

    let report = launcher.launch().context("Launch failed")?;

    success(&format!("Mint {} launched", report.mint()));
    print_signature("create", &report.created.signature, config);
    for signature in &report.created.metadata_fields {
        print_signature("metadata", signature, config);
    }
    print_signature("mint", &report.mint_supply, config);
    print_signature("transfer", &report.transfer, config);
    for signature in &report.harvest.signatures {
        print_signature("harvest", signature, config);
    }
    if let Some(signature) = &report.handoff {
        print_signature("authority", signature, config);
    }

    println!("Fee quoted:    {}", format_amount(report.quote.fee(), decimals));
    println!(
        "Fees harvested: {} from {} accounts",
        format_amount(report.harvest.withheld, decimals),
        report.harvest.sources.len()
    );
    println!("Mint authority: {:?}", report.authority);
    Ok(())
}

pub fn harvest(config_path: &str, mint: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let mint = parse_pubkey(mint)?;
    if !config.keys.persist {
        anyhow::bail!("Harvesting an existing mint needs persisted keys (keys.persist = true)");
    }
    let ledger = connect(&config)?;
    harvest_mint(&config, &ledger, &mut file_keys(&config)?, mint)
}

fn harvest_mint<K: KeyProvider>(
    config: &LaunchConfig,
    ledger: &RpcLedger,
    keys: &mut K,
    mint: Pubkey,
) -> Result<()> {
    let options = LaunchOptions::from_config(config)?;
    let decimals = options.token.decimals();
    let mut launcher = TokenLauncher::new(keys, ledger, options);

    let report = launcher.harvest(mint).context("Harvest failed")?;
    if report.signatures.is_empty() {
        info("Nothing withheld");
        return Ok(());
    }
    for signature in &report.signatures {
        print_signature("harvest", signature, config);
    }
    success(&format!(
        "Harvested {} from {} accounts",
        format_amount(report.withheld, decimals),
        report.sources.len()
    ));
    Ok(())
}
