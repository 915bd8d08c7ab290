//! ccs-cli: score a wallet, inspect its factors, and sign attestations.
//!
//! Reads layered config (file → `CCS_*` env), queries an Etherscan-compatible
//! explorer, and writes `score.json` plus a signed attestation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{Context, Result, bail};
use ccs_attest::{AttestationSigner, AttesterKey, ScoreSubmission, unix_now};
use ccs_core::merkle::FactorTree;
use ccs_core::traits::{DataSource, Publisher};
use ccs_etherscan::{EtherscanClient, RetryingSource};
use ccs_oracle::{AppConfig, JsonFilePublisher, ScoringPipeline, write_score_artifact};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "ccs-cli", version, about = "Wallet credit scoring with signed attestations")]
struct Cli {
    /// Config file (default: <config_dir>/ccs/config.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// ETH/USD price override
    #[arg(long, global = true)]
    eth_usd: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a wallet, write score.json, and sign an attestation
    Score(ScoreArgs),
    /// Print the extracted factors and per-factor contributions
    Factors(WalletArg),
    /// Print the factors commitment, optionally with a disclosure proof
    Commit(CommitArgs),
    /// Score several wallets concurrently (unsigned unless a key is set)
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct WalletArg {
    wallet: Address,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    wallet: Address,

    /// Directory for score.json (overrides config output_dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File holding the hex attester key (default: ATTESTER_PK env var)
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Skip signing; only score and commit
    #[arg(long)]
    no_sign: bool,

    /// Also write the attestation via the JSON-file publisher
    #[arg(long)]
    publish: bool,
}

#[derive(Args, Debug)]
struct CommitArgs {
    wallet: Address,

    /// Emit an inclusion proof for this factor name
    #[arg(long)]
    prove: Option<String>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[arg(required = true)]
    wallets: Vec<Address>,

    /// Wallets scored at once (overrides config concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    key_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let mut cfg = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(price) = cli.eth_usd {
        cfg.pricing.eth_usd = price;
    }
    if cfg.explorer.api_key.is_empty() {
        warn!("no explorer API key configured; requests may be throttled");
    }

    match cli.command {
        Commands::Score(args) => cmd_score(&cfg, args).await,
        Commands::Factors(args) => cmd_factors(&cfg, args).await,
        Commands::Commit(args) => cmd_commit(&cfg, args).await,
        Commands::Batch(args) => cmd_batch(&cfg, args).await,
    }
}

fn build_source(cfg: &AppConfig) -> Result<Arc<dyn DataSource>> {
    let client = EtherscanClient::new(cfg.explorer.clone()).context("building explorer client")?;
    Ok(Arc::new(RetryingSource::new(client, cfg.retry)))
}

fn load_key(key_file: Option<&Path>) -> Result<AttesterKey> {
    match key_file {
        Some(path) => {
            let secret = Zeroizing::new(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading key file {}", path.display()))?,
            );
            AttesterKey::from_hex(&secret).context("parsing attester key")
        }
        None => AttesterKey::from_env().context("reading attester key from ATTESTER_PK"),
    }
}

fn build_signer(cfg: &AppConfig, key: AttesterKey) -> Result<AttestationSigner> {
    let signer = AttestationSigner::new(
        key,
        &cfg.attestation.domain(),
        cfg.attestation.validity_secs,
    )
    .context("configuring attestation signer")?
    .with_nonce_source(cfg.attestation.nonce.build());
    info!(attester = %signer.attester(), "attester key loaded");
    Ok(signer)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_score(cfg: &AppConfig, args: ScoreArgs) -> Result<()> {
    if args.no_sign && args.publish {
        bail!("--publish needs a signed attestation; drop --no-sign");
    }
    let mut pipeline = ScoringPipeline::from_config(cfg, build_source(cfg)?)?;
    if !args.no_sign {
        let key = load_key(args.key_file.as_deref())?;
        pipeline = pipeline.with_signer(build_signer(cfg, key)?);
    }

    let run = pipeline
        .run(&args.wallet, unix_now())
        .await
        .with_context(|| format!("scoring {}", args.wallet))?;

    let out_dir = args.output_dir.unwrap_or_else(|| cfg.output_dir.clone());
    let path = write_score_artifact(&out_dir, &run.report).await?;
    println!("Score: {} ({})", run.report.score, path.display());

    if let Some(att) = &run.attestation {
        print_json(&ScoreSubmission::from(att))?;
        if args.publish {
            JsonFilePublisher::new(&out_dir).publish(att).await?;
        }
    }
    Ok(())
}

async fn cmd_factors(cfg: &AppConfig, args: WalletArg) -> Result<()> {
    let pipeline = ScoringPipeline::from_config(cfg, build_source(cfg)?)?;
    let report = pipeline
        .evaluate(&args.wallet, unix_now())
        .await
        .with_context(|| format!("extracting factors for {}", args.wallet))?;
    print_json(&report)
}

async fn cmd_commit(cfg: &AppConfig, args: CommitArgs) -> Result<()> {
    let pipeline = ScoringPipeline::from_config(cfg, build_source(cfg)?)?;
    let factors = pipeline
        .extract(&args.wallet, unix_now())
        .await
        .with_context(|| format!("extracting factors for {}", args.wallet))?;
    let tree = FactorTree::build(factors.factor_pairs());
    println!("{}", tree.root());

    if let Some(key) = args.prove {
        let Some(proof) = tree.proof(&key) else {
            bail!("unknown factor {key:?}");
        };
        print_json(&proof)?;
    }
    Ok(())
}

async fn cmd_batch(cfg: &AppConfig, args: BatchArgs) -> Result<()> {
    let mut pipeline = ScoringPipeline::from_config(cfg, build_source(cfg)?)?;
    match load_key(args.key_file.as_deref()) {
        Ok(key) => pipeline = pipeline.with_signer(build_signer(cfg, key)?),
        Err(err) => warn!(error = %err, "no attester key; batch results are unsigned"),
    }

    let concurrency = args.concurrency.unwrap_or(cfg.concurrency);
    let results = pipeline.score_many(&args.wallets, unix_now(), concurrency).await;

    let mut failed = 0usize;
    for (wallet, result) in &results {
        match result {
            Ok(run) => println!("{wallet} {} {}", run.report.score, run.report.factors_root),
            Err(err) => {
                failed += 1;
                println!("{wallet} error: {err}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} wallets failed", results.len());
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// `RUST_LOG` takes precedence over `level_str`. Pass `format = "json"` for
/// structured JSON output; anything else gives human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // Logs go to stderr so stdout stays machine-readable.
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_score_command() {
        let cli = Cli::try_parse_from([
            "ccs-cli",
            "--eth-usd",
            "2500",
            "score",
            "0x87870Bca3F3fD6335C3F4ce8392D69350B4fA4E2",
            "--no-sign",
        ])
        .unwrap();
        assert_eq!(cli.eth_usd, Some(2500.0));
        match cli.command {
            Commands::Score(args) => assert!(args.no_sign),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_wallet() {
        assert!(Cli::try_parse_from(["ccs-cli", "factors", "not-a-wallet"]).is_err());
    }

    #[test]
    fn batch_needs_wallets() {
        assert!(Cli::try_parse_from(["ccs-cli", "batch"]).is_err());
    }
}
