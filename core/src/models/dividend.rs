use rust_decimal::Decimal;
use serde::Serialize;

pub const TABLE_SOURCE: &str = "lynx_pdf";
pub const TEXT_SOURCE: &str = "lynx_pdf_text";

/// A dividend payment scraped from a broker PDF, either from a table row or a text line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendRecord {
    pub symbol: String,
    pub date: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub source: String,
}

impl DividendRecord {
    /// Records are considered the same payment when symbol, date and amount agree.
    pub fn dedup_key(&self) -> (String, String, Decimal) {
        (self.symbol.clone(), self.date.clone(), self.amount.normalize())
    }
}

/// A dividend event returned by the market data provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedDividend {
    pub symbol: String,
    pub yahoo_symbol: String,
    pub exchange: String,
    pub isin: Option<String>,
    pub ex_date: String,
    pub amount: Decimal,
    pub currency: String,
}
