use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;

use crate::{
    cli::shared::format_count,
    services::{
        files::save_json,
        holdings::{CommandHoldingsSource, HoldingsSource},
        market_data::{
            fetch::{fetch_dividends, fetch_history, fetch_profile, FetchTarget},
            provider::MarketDataProvider,
            yahoo::YahooClient,
        },
        shared::{
            constants::{DIVIDENDS_DIR, HISTORY_DIR, PROFILES_DIR},
            env::{check_for_env_variables, data_dir},
            logger::init_logger,
            safe_file_name,
        },
    },
};

#[derive(Parser, Debug)]
#[command(about = "Fetch dividend, price and profile data from Yahoo Finance")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Fetch dividend history (omit the symbol for all held symbols)
    Dividends {
        /// Yahoo Finance symbol
        symbol: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Fetch price history
    History {
        /// Yahoo Finance symbol
        symbol: String,
    },
    /// Fetch company profile
    Profile {
        /// Yahoo Finance symbol
        symbol: String,
    },
}

pub fn wants_all_symbols(symbol: Option<&str>, all: bool) -> bool {
    all || matches!(symbol, None | Some("all") | Some("--all"))
}

fn output_path(data_dir: &Path, kind: &str, yahoo_symbol: &str) -> PathBuf {
    data_dir
        .join(kind)
        .join(format!("{}.json", safe_file_name(yahoo_symbol)))
}

fn save<T: serde::Serialize + ?Sized>(
    data: &T,
    data_dir: &Path,
    kind: &str,
    yahoo_symbol: &str,
) -> anyhow::Result<PathBuf> {
    let path = output_path(data_dir, kind, yahoo_symbol);
    save_json(data, &path)?;
    println!("  Saved: {}", path.display());
    Ok(path)
}

async fn dividends_for_target<P: MarketDataProvider>(
    provider: &P,
    target: &FetchTarget,
    data_dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    match fetch_dividends(provider, target).await {
        Some(records) if !records.is_empty() => Ok(Some(save(
            &records,
            data_dir,
            DIVIDENDS_DIR,
            &target.yahoo_symbol,
        )?)),
        _ => Ok(None),
    }
}

/// Fetches dividends for one symbol or for every holding. Returns the files written.
pub async fn cmd_dividends<P, H>(
    provider: &P,
    holdings: &H,
    symbol: Option<&str>,
    all: bool,
    data_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>>
where
    P: MarketDataProvider,
    H: HoldingsSource,
{
    let mut written = vec![];

    if !wants_all_symbols(symbol, all) {
        let target = FetchTarget::direct(symbol.unwrap_or_default());
        written.extend(dividends_for_target(provider, &target, data_dir).await?);
        return Ok(written);
    }

    let symbols = holdings.list_symbols()?;
    if symbols.is_empty() {
        println!("No symbols found in database");
        return Ok(written);
    }
    println!(
        "Fetching dividends for {} symbols...",
        format_count(symbols.len())
    );
    for holding in &symbols {
        let target = FetchTarget::from_holding(holding);
        written.extend(dividends_for_target(provider, &target, data_dir).await?);
    }
    info!(
        "Wrote dividend files for {}/{} symbols",
        written.len(),
        symbols.len()
    );
    Ok(written)
}

pub async fn cmd_history<P: MarketDataProvider>(
    provider: &P,
    symbol: &str,
    data_dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    let target = FetchTarget::direct(symbol);
    match fetch_history(provider, &target).await {
        Some(records) => Ok(Some(save(&records, data_dir, HISTORY_DIR, symbol)?)),
        None => Ok(None),
    }
}

pub async fn cmd_profile<P: MarketDataProvider>(
    provider: &P,
    symbol: &str,
    data_dir: &Path,
) -> anyhow::Result<Option<PathBuf>> {
    let target = FetchTarget::direct(symbol);
    match fetch_profile(provider, &target).await {
        Some(record) => Ok(Some(save(&record, data_dir, PROFILES_DIR, symbol)?)),
        None => Ok(None),
    }
}

pub async fn run() -> anyhow::Result<()> {
    init_logger();
    let args = Args::parse();

    let Some(cmd) = args.cmd else {
        Args::command().print_help()?;
        return Ok(());
    };

    check_for_env_variables();
    let provider = YahooClient::new()?;
    let data_dir = data_dir();

    match cmd {
        Command::Dividends { symbol, all } => {
            let holdings = CommandHoldingsSource::from_env();
            cmd_dividends(&provider, &holdings, symbol.as_deref(), all, &data_dir).await?;
        }
        Command::History { symbol } => {
            cmd_history(&provider, &symbol, &data_dir).await?;
        }
        Command::Profile { symbol } => {
            cmd_profile(&provider, &symbol, &data_dir).await?;
        }
    }
    Ok(())
}
