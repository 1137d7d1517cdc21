use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DividendHistory {
    pub currency: Option<String>,
    pub events: Vec<DividendEvent>,
}

/// Daily bar as delivered by the provider. Yahoo leaves gaps as nulls, hence the options.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileInfo {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub market_cap: Option<i64>,
    pub dividend_rate: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub ex_dividend_date: Option<i64>,
    pub payout_ratio: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

/// Source of dividend, price and profile data keyed by provider symbol.
/// `Ok(None)` and empty vectors mean the provider knows nothing about the symbol.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    async fn dividends(&self, symbol: &str) -> anyhow::Result<Option<DividendHistory>>;
    async fn history(&self, symbol: &str) -> anyhow::Result<Vec<PriceBar>>;
    async fn profile(&self, symbol: &str) -> anyhow::Result<Option<ProfileInfo>>;
}
