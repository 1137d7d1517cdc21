use rust_decimal::{prelude::FromPrimitive, Decimal};
use tracing::{error, info};

use super::provider::MarketDataProvider;
use crate::{
    models::{
        dividend::FetchedDividend,
        holding::Holding,
        market::{FetchedBar, FetchedProfile},
    },
    services::{instruments::identifiers::get_yahoo_symbol, shared::round_to_decimals},
};

const DIVIDEND_DECIMALS: u32 = 6;
const PRICE_DECIMALS: u32 = 4;
const DEFAULT_CURRENCY: &str = "USD";

/// What to ask the provider for and how to label the answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTarget {
    pub yahoo_symbol: String,
    pub symbol: String,
    pub exchange: String,
    pub isin: Option<String>,
}

impl FetchTarget {
    /// A symbol given on the command line is already in Yahoo notation.
    pub fn direct(yahoo_symbol: &str) -> Self {
        Self {
            yahoo_symbol: yahoo_symbol.to_string(),
            symbol: yahoo_symbol.to_string(),
            exchange: String::new(),
            isin: None,
        }
    }

    pub fn from_holding(holding: &Holding) -> Self {
        Self {
            yahoo_symbol: get_yahoo_symbol(&holding.symbol, &holding.exchange),
            symbol: holding.symbol.clone(),
            exchange: holding.exchange.clone(),
            isin: holding.isin.clone(),
        }
    }
}

fn rounded(value: f64, decimals: u32) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| round_to_decimals(d, decimals))
}

pub async fn fetch_dividends<P: MarketDataProvider>(
    provider: &P,
    target: &FetchTarget,
) -> Option<Vec<FetchedDividend>> {
    info!("Fetching dividends for {}...", target.yahoo_symbol);
    let history = match provider.dividends(&target.yahoo_symbol).await {
        Ok(Some(history)) if !history.events.is_empty() => history,
        Ok(_) => {
            info!("No dividend data for {}", target.yahoo_symbol);
            return None;
        }
        Err(e) => {
            error!("Error fetching {}: {}", target.yahoo_symbol, e);
            return None;
        }
    };

    let currency = history
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let records = history
        .events
        .into_iter()
        .filter_map(|event| {
            Some(FetchedDividend {
                symbol: target.symbol.clone(),
                yahoo_symbol: target.yahoo_symbol.clone(),
                exchange: target.exchange.clone(),
                isin: target.isin.clone(),
                ex_date: event.date.format("%Y-%m-%d").to_string(),
                amount: rounded(event.amount, DIVIDEND_DECIMALS)?,
                currency: currency.clone(),
            })
        })
        .collect();
    Some(records)
}

pub async fn fetch_history<P: MarketDataProvider>(
    provider: &P,
    target: &FetchTarget,
) -> Option<Vec<FetchedBar>> {
    info!("Fetching history for {}...", target.yahoo_symbol);
    let bars = match provider.history(&target.yahoo_symbol).await {
        Ok(bars) => bars,
        Err(e) => {
            error!("Error fetching {}: {}", target.yahoo_symbol, e);
            return None;
        }
    };

    let records: Vec<FetchedBar> = bars
        .into_iter()
        .filter_map(|bar| {
            Some(FetchedBar {
                symbol: target.symbol.clone(),
                yahoo_symbol: target.yahoo_symbol.clone(),
                date: bar.date.format("%Y-%m-%d").to_string(),
                open: rounded(bar.open?, PRICE_DECIMALS)?,
                high: rounded(bar.high?, PRICE_DECIMALS)?,
                low: rounded(bar.low?, PRICE_DECIMALS)?,
                close: rounded(bar.close?, PRICE_DECIMALS)?,
                volume: bar.volume?,
            })
        })
        .collect();

    if records.is_empty() {
        info!("No history for {}", target.yahoo_symbol);
        return None;
    }
    Some(records)
}

pub async fn fetch_profile<P: MarketDataProvider>(
    provider: &P,
    target: &FetchTarget,
) -> Option<FetchedProfile> {
    info!("Fetching profile for {}...", target.yahoo_symbol);
    let profile = match provider.profile(&target.yahoo_symbol).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            info!("No profile for {}", target.yahoo_symbol);
            return None;
        }
        Err(e) => {
            error!("Error fetching {}: {}", target.yahoo_symbol, e);
            return None;
        }
    };

    Some(FetchedProfile {
        symbol: target.symbol.clone(),
        yahoo_symbol: target.yahoo_symbol.clone(),
        exchange: target.exchange.clone(),
        isin: target.isin.clone(),
        name: profile.name,
        sector: profile.sector,
        industry: profile.industry,
        country: profile.country,
        currency: profile.currency,
        market_cap: profile.market_cap,
        dividend_rate: profile.dividend_rate,
        dividend_yield: profile.dividend_yield,
        ex_dividend_date: profile.ex_dividend_date,
        payout_ratio: profile.payout_ratio,
        trailing_pe: profile.trailing_pe,
        forward_pe: profile.forward_pe,
        price: profile.price,
        fifty_two_week_high: profile.fifty_two_week_high,
        fifty_two_week_low: profile.fifty_two_week_low,
    })
}
