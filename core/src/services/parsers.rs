use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::warn;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}\.\d{2}\.\d{4}").unwrap());
static ISO_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static SLASH_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})").unwrap());
static DOT_DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})").unwrap());
static CELL_AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[\d,]+\.?\d*$").unwrap());
static SIGNED_AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[\d,]+\.?\d+").unwrap());
static TEXT_AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,]+\.?\d*").unwrap());

pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Why a table row produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooFewCells,
    NoDate,
    NoAmount,
    UnparseableAmount,
    AmountOutOfRange,
    ZeroAmount,
    NoSymbol,
}

/// Result of parsing a single table row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Parsed(T),
    Skipped(SkipReason),
}

impl<T> RowOutcome<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            RowOutcome::Parsed(record) => Some(record),
            RowOutcome::Skipped(_) => None,
        }
    }
}

/// Trims every cell, mapping missing cells to empty strings.
pub fn clean_cells(row: &[Option<String>]) -> Vec<String> {
    row.iter()
        .map(|cell| cell.as_deref().unwrap_or("").trim().to_string())
        .collect()
}

/// First date-looking token in `text`, ISO, slash or dot notation.
pub fn find_date(text: &str) -> Option<&str> {
    DATE_PATTERN.find(text).map(|m| m.as_str())
}

pub fn find_iso_dates(text: &str) -> Vec<String> {
    ISO_DATE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrites `DD/MM/YYYY` and `DD.MM.YYYY` to `YYYY-MM-DD`, assuming day first.
/// Anything else is returned as is.
pub fn normalize_date(date_str: &str) -> String {
    for pattern in [&*SLASH_DATE_PATTERN, &*DOT_DATE_PATTERN] {
        if let Some(caps) = pattern.captures(date_str) {
            return format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]);
        }
    }
    date_str.to_string()
}

pub fn strip_thousands_separators(value: &str) -> String {
    value.replace(',', "")
}

/// Returns the cell without thousands separators if the whole cell is a number.
pub fn match_cell_amount(cell: &str) -> Option<String> {
    let stripped = strip_thousands_separators(cell);
    if CELL_AMOUNT_PATTERN.is_match(&stripped) {
        Some(stripped)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    Invalid(String),
    /// A well-formed number beyond the 28 significant digits `Decimal` holds.
    OutOfRange(String),
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Invalid(value) => write!(f, "Invalid amount: {}", value),
            AmountError::OutOfRange(value) => write!(f, "Amount out of range: {}", value),
        }
    }
}

impl std::error::Error for AmountError {}

pub fn parse_decimal(value: &str) -> Result<Decimal, AmountError> {
    let value = value.trim();
    let value = value.strip_suffix('.').unwrap_or(value);
    Decimal::from_str(value).map_err(|_| {
        let plain_number = value
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'));
        if plain_number && value.parse::<f64>().is_ok() {
            AmountError::OutOfRange(value.to_string())
        } else {
            AmountError::Invalid(value.to_string())
        }
    })
}

/// All signed numbers inside `text`, thousands separators removed first.
/// Numbers too large for `Decimal` are logged and left out.
pub fn find_signed_amounts(text: &str) -> Vec<Decimal> {
    let stripped = strip_thousands_separators(text);
    SIGNED_AMOUNT_PATTERN
        .find_iter(&stripped)
        .filter_map(|m| match parse_decimal(m.as_str()) {
            Ok(amount) => Some(amount),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

/// Every number-looking substring of a free text line, kept verbatim.
pub fn find_text_amounts(line: &str) -> Vec<String> {
    TEXT_AMOUNT_PATTERN
        .find_iter(line)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_symbol_candidate(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().count() <= 10 && cell.chars().all(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("31/01/2024"), "2024-01-31");
        assert_eq!(normalize_date("31.01.2024"), "2024-01-31");
        assert_eq!(normalize_date("2024-01-31"), "2024-01-31");
        assert_eq!(normalize_date("Jan 31"), "Jan 31");
    }

    #[test]
    fn test_find_date_prefers_first_occurrence() {
        assert_eq!(find_date("paid 2024-01-15"), Some("2024-01-15"));
        assert_eq!(find_date("15/01/2024"), Some("15/01/2024"));
        assert_eq!(find_date("15.01.2024 and 2024-02-01"), Some("15.01.2024"));
        assert_eq!(find_date("no date"), None);
    }

    #[test]
    fn test_match_cell_amount_requires_full_match() {
        assert_eq!(match_cell_amount("1,234.56").as_deref(), Some("1234.56"));
        assert_eq!(match_cell_amount("-12.5").as_deref(), Some("-12.5"));
        assert_eq!(match_cell_amount("12a"), None);
        assert_eq!(match_cell_amount("2024-01-15"), None);
        assert_eq!(match_cell_amount("USD"), None);
        assert_eq!(match_cell_amount(""), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("7.").unwrap(), dec!(7));
        assert_eq!(
            parse_decimal("abc"),
            Err(AmountError::Invalid("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_decimal_out_of_range() {
        let huge = "123456789012345678901234567890";
        assert_eq!(
            parse_decimal(huge),
            Err(AmountError::OutOfRange(huge.to_string()))
        );
        assert_eq!(
            parse_decimal("-123456789012345678901234567890.50"),
            Err(AmountError::OutOfRange(
                "-123456789012345678901234567890.50".to_string()
            ))
        );
        assert_eq!(
            parse_decimal("1e5"),
            Err(AmountError::Invalid("1e5".to_string()))
        );
    }

    #[test]
    fn test_find_text_amounts_is_partial() {
        assert_eq!(find_text_amounts("12a 34.50 USD"), vec!["12", "34.50"]);
        assert_eq!(find_text_amounts("Total 1,234.00"), vec!["1,234.00"]);
        assert!(find_text_amounts("nothing here").is_empty());
    }

    #[test]
    fn test_find_signed_amounts() {
        assert_eq!(
            find_signed_amounts("-1,250.75 EUR"),
            vec![dec!(-1250.75)]
        );
        assert_eq!(find_signed_amounts("12 and 3.5"), vec![dec!(12), dec!(3.5)]);
        assert_eq!(
            find_signed_amounts("123456789012345678901234567890 and 4.10"),
            vec![dec!(4.10)]
        );
    }

    #[test]
    fn test_is_symbol_candidate() {
        assert!(is_symbol_candidate("AAPL"));
        assert!(is_symbol_candidate("Dividend"));
        assert!(!is_symbol_candidate("BRK.B"));
        assert!(!is_symbol_candidate("ABCDEFGHIJK"));
        assert!(!is_symbol_candidate(""));
    }

    #[test]
    fn test_clean_cells() {
        let row = vec![Some(" AAPL ".to_string()), None, Some("1.50\n".to_string())];
        assert_eq!(clean_cells(&row), vec!["AAPL", "", "1.50"]);
    }
}
