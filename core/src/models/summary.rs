use serde::Serialize;

pub const SUMMARY_SOURCE: &str = "16b_pdf";

/// A totals line from a 16B summary. Amounts stay as matched text, their meaning is not typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub line: String,
    pub amounts: Vec<String>,
    pub source: String,
}
