//! # Recommend a spread for today's market file
//! spreadlab recommend --market data/snapshot.toml --balance 100000 --account medium
//!
//! # Run a backtest over a daily-bar history
//! spreadlab backtest --history data/spy_daily.csv --balance 100000 --monthly

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use spreadlab::backtest::EntrySampling;
use spreadlab::{
    Advisor, BacktestEngine, Config, MarketSnapshot, OptionChainSlice,
};
use spreadlab::data::load_daily_bars;
use spreadlab::risk::{AccountInfo, AccountType};

#[derive(Parser)]
#[command(name = "spreadlab")]
#[command(about = "Options-spread signal engine and backtester")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a spread for a market snapshot file
    Recommend {
        /// TOML file with [snapshot] and [chain] sections from the data collaborator
        #[arg(short, long)]
        market: PathBuf,

        /// Account balance
        #[arg(long, default_value = "100000")]
        balance: Decimal,

        /// Account type: small, medium, or large
        #[arg(long, default_value = "medium")]
        account: String,

        /// Current drawdown from the account peak, 0.0-1.0
        #[arg(long, default_value_t = 0.0)]
        drawdown: f64,
    },

    /// Run a backtest over a daily-bar CSV history
    Backtest {
        /// CSV with date, open, high, low, close, volume, vix columns
        #[arg(long)]
        history: PathBuf,

        /// Starting balance
        #[arg(long, default_value = "100000")]
        balance: Decimal,

        /// Enter only around mid-month instead of daily
        #[arg(long)]
        monthly: bool,

        /// Account type: small, medium, or large
        #[arg(long, default_value = "medium")]
        account: String,
    },
}

/// On-disk market file produced by the data collaborator.
#[derive(Deserialize)]
struct MarketFile {
    snapshot: MarketSnapshot,
    chain: OptionChainSlice,
}

fn parse_account_type(s: &str) -> anyhow::Result<AccountType> {
    match s.to_lowercase().as_str() {
        "small" => Ok(AccountType::Small),
        "medium" => Ok(AccountType::Medium),
        "large" => Ok(AccountType::Large),
        other => bail!("unknown account type '{other}', expected small/medium/large"),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Recommend {
            market,
            balance,
            account,
            drawdown,
        } => {
            let contents = std::fs::read_to_string(&market)
                .with_context(|| format!("reading market file {}", market.display()))?;
            let file: MarketFile =
                toml::from_str(&contents).context("parsing market file")?;

            let account = AccountInfo {
                balance,
                account_type: parse_account_type(&account)?,
                current_drawdown: drawdown,
            };

            let advisor = Advisor::new(config);
            let recommendation = advisor.recommend(&file.snapshot, &file.chain, &account)?;
            println!("{}", recommendation.reasoning);
        }

        Commands::Backtest {
            history,
            balance,
            monthly,
            account,
        } => {
            let bars = load_daily_bars(&history)
                .with_context(|| format!("loading history {}", history.display()))?;

            let sampling = if monthly {
                EntrySampling::Monthly
            } else {
                EntrySampling::Daily
            };
            let backtest_config =
                config.backtest_config(sampling, parse_account_type(&account)?);

            let mut engine = BacktestEngine::new(backtest_config);
            let result = engine.run(&bars, balance);
            println!("{}", result.summary());
        }
    }

    Ok(())
}
