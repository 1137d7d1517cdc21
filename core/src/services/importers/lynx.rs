use std::path::Path;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    models::{
        cost::{CostRecord, COST_SOURCE},
        dividend::{DividendRecord, TABLE_SOURCE, TEXT_SOURCE},
        summary::{SummaryRecord, SUMMARY_SOURCE},
        trade::{TradeRecord, TRADE_SOURCE},
    },
    services::{
        documents::{DocumentLoader, PdfDocument},
        parsers::{
            clean_cells, find_date, find_iso_dates, find_signed_amounts, find_text_amounts,
            is_symbol_candidate, match_cell_amount, normalize_date, parse_decimal, AmountError,
            RowOutcome, SkipReason, UNKNOWN_SYMBOL,
        },
    },
};

// SYMBOL 2024-01-15 Cash Dividend 123.45 USD
static DIVIDEND_LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Z]{1,10})\s+(\d{4}-\d{2}-\d{2})\s+.*?(?:dividend|payment).*?([\d,]+\.?\d*)\s+([A-Z]{3})",
    )
    .unwrap()
});

const SUMMARY_KEYWORDS: [&str; 4] = ["total", "yhteensä", "summa", "net"];
const SUMMARY_PAGES: usize = 5;

const DIVIDEND_ROW_MIN_CELLS: usize = 5;
const TRADE_ROW_MIN_CELLS: usize = 4;
const COST_ROW_MIN_CELLS: usize = 2;
const TRADE_SYMBOL_MAX_LEN: usize = 15;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_progress(page_index: usize, page_count: usize, every: usize) {
    if (page_index + 1) % every == 0 {
        info!("Processed {}/{} pages...", page_index + 1, page_count);
    }
}

/// Typical layout: Symbol | Date | Description | Amount | Currency
pub fn parse_dividend_row(row: &[Option<String>]) -> RowOutcome<DividendRecord> {
    if row.len() < DIVIDEND_ROW_MIN_CELLS {
        return RowOutcome::Skipped(SkipReason::TooFewCells);
    }
    let cleaned = clean_cells(row);

    let date_str = cleaned.iter().find_map(|cell| find_date(cell));
    let amount_str = cleaned.iter().find_map(|cell| match_cell_amount(cell));
    let symbol = cleaned
        .iter()
        .find(|cell| is_symbol_candidate(cell))
        .cloned()
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());

    let Some(date_str) = date_str else {
        return RowOutcome::Skipped(SkipReason::NoDate);
    };
    let Some(amount_str) = amount_str else {
        return RowOutcome::Skipped(SkipReason::NoAmount);
    };
    let amount = match parse_decimal(&amount_str) {
        Ok(amount) => amount,
        Err(AmountError::OutOfRange(value)) => {
            warn!("Skipping dividend row with amount out of range: {}", value);
            return RowOutcome::Skipped(SkipReason::AmountOutOfRange);
        }
        Err(AmountError::Invalid(_)) => return RowOutcome::Skipped(SkipReason::UnparseableAmount),
    };
    if amount.is_zero() {
        return RowOutcome::Skipped(SkipReason::ZeroAmount);
    }

    RowOutcome::Parsed(DividendRecord {
        symbol,
        date: normalize_date(date_str),
        amount: amount.abs(),
        raw_amount: Some(amount),
        currency: None,
        source: TABLE_SOURCE.to_string(),
    })
}

/// Fallback for dividends that are only present as running text.
pub fn parse_dividend_text(text: &str) -> Vec<DividendRecord> {
    DIVIDEND_LINE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let amount = match parse_decimal(&caps[3].replace(',', "")) {
                Ok(amount) => amount,
                Err(e) => {
                    warn!("Skipping dividend line: {}", e);
                    return None;
                }
            };
            if amount <= Decimal::ZERO {
                return None;
            }
            Some(DividendRecord {
                symbol: caps[1].to_string(),
                date: caps[2].to_string(),
                amount,
                raw_amount: None,
                currency: Some(caps[4].to_string()),
                source: TEXT_SOURCE.to_string(),
            })
        })
        .collect()
}

pub fn dedup_dividends(records: Vec<DividendRecord>) -> Vec<DividendRecord> {
    records
        .into_iter()
        .unique_by(|record| record.dedup_key())
        .collect()
}

pub fn extract_dividends(
    loader: &dyn DocumentLoader,
    path: &Path,
) -> anyhow::Result<Vec<DividendRecord>> {
    info!("Extracting dividends from {}...", file_name(path));
    let document = loader.open(path)?;
    let page_count = document.page_count();
    let mut records = vec![];

    for page_index in 0..page_count {
        let page = document.page(page_index)?;
        records.extend(
            page.tables
                .iter()
                .flatten()
                .filter_map(|row| parse_dividend_row(row).parsed()),
        );
        if !page.text.is_empty() {
            records.extend(parse_dividend_text(&page.text));
        }
        log_progress(page_index, page_count, 50);
    }

    let unique = dedup_dividends(records);
    info!("Found {} unique dividend records", unique.len());
    Ok(unique)
}

pub fn parse_trade_row(row: &[Option<String>]) -> RowOutcome<TradeRecord> {
    if row.len() < TRADE_ROW_MIN_CELLS {
        return RowOutcome::Skipped(SkipReason::TooFewCells);
    }
    let cleaned = clean_cells(row);

    let dates = cleaned.iter().flat_map(|cell| find_iso_dates(cell)).collect_vec();
    let amounts = cleaned
        .iter()
        .flat_map(|cell| find_signed_amounts(cell))
        .collect_vec();

    let Some(date) = dates.into_iter().next() else {
        return RowOutcome::Skipped(SkipReason::NoDate);
    };
    if amounts.is_empty() {
        return RowOutcome::Skipped(SkipReason::NoAmount);
    }
    let symbol = &cleaned[0];
    if symbol.is_empty() || symbol.chars().count() > TRADE_SYMBOL_MAX_LEN {
        return RowOutcome::Skipped(SkipReason::NoSymbol);
    }

    RowOutcome::Parsed(TradeRecord {
        symbol: symbol.clone(),
        date,
        amounts,
        source: TRADE_SOURCE.to_string(),
    })
}

fn collect_9a_trades(
    document: &dyn PdfDocument,
    records: &mut Vec<TradeRecord>,
) -> anyhow::Result<()> {
    let page_count = document.page_count();
    for page_index in 0..page_count {
        let page = document.page(page_index)?;
        records.extend(
            page.tables
                .iter()
                .flatten()
                .filter_map(|row| parse_trade_row(row).parsed()),
        );
        log_progress(page_index, page_count, 100);
    }
    Ok(())
}

/// Trades from a 9A tax report. A broken document keeps whatever was read before the failure.
pub fn extract_9a_trades(loader: &dyn DocumentLoader, path: &Path) -> Vec<TradeRecord> {
    info!("Extracting 9A trades from {}...", file_name(path));
    let mut records = vec![];

    let result = loader
        .open(path)
        .and_then(|document| collect_9a_trades(document.as_ref(), &mut records));
    if let Err(e) = result {
        warn!("Error processing {}: {}", file_name(path), e);
    }

    info!("Found {} trade records", records.len());
    records
}

pub fn parse_summary_lines(text: &str) -> Vec<SummaryRecord> {
    text.split('\n')
        .filter(|line| {
            let lowered = line.to_lowercase();
            SUMMARY_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
        })
        .filter_map(|line| {
            let amounts = find_text_amounts(line);
            if amounts.is_empty() {
                return None;
            }
            Some(SummaryRecord {
                line: line.trim().to_string(),
                amounts,
                source: SUMMARY_SOURCE.to_string(),
            })
        })
        .collect()
}

fn collect_16b_summary(
    document: &dyn PdfDocument,
    records: &mut Vec<SummaryRecord>,
) -> anyhow::Result<()> {
    // totals sit on the first pages
    for page_index in 0..document.page_count().min(SUMMARY_PAGES) {
        let page = document.page(page_index)?;
        if !page.text.is_empty() {
            records.extend(parse_summary_lines(&page.text));
        }
    }
    Ok(())
}

pub fn extract_16b_summary(loader: &dyn DocumentLoader, path: &Path) -> Vec<SummaryRecord> {
    info!("Extracting 16B summary from {}...", file_name(path));
    let mut records = vec![];

    let result = loader
        .open(path)
        .and_then(|document| collect_16b_summary(document.as_ref(), &mut records));
    if let Err(e) = result {
        warn!("Error processing {}: {}", file_name(path), e);
    }

    info!("Found {} summary lines", records.len());
    records
}

fn parse_cost_cell(cell: &str) -> Option<Decimal> {
    let compact = cell.replace([',', ' '], "");
    match parse_decimal(&compact) {
        Ok(amount) => Some(amount),
        Err(AmountError::OutOfRange(value)) => {
            warn!("Ignoring cost amount out of range: {}", value);
            None
        }
        Err(AmountError::Invalid(_)) => Decimal::from_scientific(&compact).ok(),
    }
}

pub fn parse_cost_row(row: &[Option<String>]) -> RowOutcome<CostRecord> {
    if row.len() < COST_ROW_MIN_CELLS {
        return RowOutcome::Skipped(SkipReason::TooFewCells);
    }
    let cleaned = clean_cells(row);

    let amounts = cleaned
        .iter()
        .filter_map(|cell| parse_cost_cell(cell))
        .collect_vec();
    if amounts.is_empty() {
        return RowOutcome::Skipped(SkipReason::NoAmount);
    }

    RowOutcome::Parsed(CostRecord {
        description: cleaned.iter().filter(|cell| !cell.is_empty()).join(" | "),
        amounts,
        source: COST_SOURCE.to_string(),
    })
}

fn collect_costs(document: &dyn PdfDocument, records: &mut Vec<CostRecord>) -> anyhow::Result<()> {
    for page_index in 0..document.page_count() {
        let page = document.page(page_index)?;
        records.extend(
            page.tables
                .iter()
                .flatten()
                .filter_map(|row| parse_cost_row(row).parsed()),
        );
    }
    Ok(())
}

pub fn extract_costs(loader: &dyn DocumentLoader, path: &Path) -> Vec<CostRecord> {
    info!("Extracting costs from {}...", file_name(path));
    let mut records = vec![];

    let result = loader
        .open(path)
        .and_then(|document| collect_costs(document.as_ref(), &mut records));
    if let Err(e) = result {
        warn!("Error processing {}: {}", file_name(path), e);
    }

    info!("Found {} cost records", records.len());
    records
}
