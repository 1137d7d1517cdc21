use rust_decimal::Decimal;
use serde::Serialize;

pub const TRADE_SOURCE: &str = "9a_pdf";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub date: String,
    pub amounts: Vec<Decimal>,
    pub source: String,
}
