use rust_decimal::Decimal;
use serde::Serialize;

pub const COST_SOURCE: &str = "cost_pdf";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRecord {
    pub description: String,
    pub amounts: Vec<Decimal>,
    pub source: String,
}
