use std::{
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tabled::{Table, Tabled};
use tracing::{info, warn};

use crate::{
    cli::shared::{format_count, print_heading},
    models::{
        cost::CostRecord, dividend::DividendRecord, summary::SummaryRecord, trade::TradeRecord,
    },
    services::{
        documents::{DocumentLoader, PdfExtractLoader},
        files::{list_pdf_files, save_json, PdfFile},
        importers::lynx::{extract_16b_summary, extract_9a_trades, extract_costs, extract_dividends},
        shared::{
            constants::{
                COSTS_FILE, DEFAULT_PDF_INPUT_DIR, DEFAULT_PDF_OUTPUT_DIR, DIVIDENDS_FILE,
                MAX_SUMMARY_REPORT_MB, MAX_TRADE_REPORT_MB, SUMMARIES_FILE, TRADES_FILE,
            },
            logger::init_logger,
        },
    },
};

#[derive(Parser, Debug)]
#[command(about = "Extract dividend and tax data from Lynx/IBKR PDF reports")]
pub struct ExtractArgs {
    /// Directory holding the PDF reports
    #[arg(long, default_value = DEFAULT_PDF_INPUT_DIR)]
    pub input: PathBuf,
    /// Directory the JSON files are written to
    #[arg(long, default_value = DEFAULT_PDF_OUTPUT_DIR)]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Dividends,
    Trades9a,
    Summary16b,
    Costs,
}

/// Classifies a report by its file name. The order of the checks matters, first hit wins.
pub fn detect_document_kind(file_name: &str) -> Option<DocumentKind> {
    let name = file_name.to_lowercase();
    match name {
        _ if name.contains("dividend") => Some(DocumentKind::Dividends),
        _ if name.contains("9a") => Some(DocumentKind::Trades9a),
        _ if name.contains("16b") => Some(DocumentKind::Summary16b),
        _ if name.contains("kustannus") || name.contains("cost") => Some(DocumentKind::Costs),
        _ => None,
    }
}

fn size_limit_mb(kind: DocumentKind) -> Option<f64> {
    match kind {
        DocumentKind::Trades9a => Some(MAX_TRADE_REPORT_MB),
        DocumentKind::Summary16b => Some(MAX_SUMMARY_REPORT_MB),
        DocumentKind::Dividends | DocumentKind::Costs => None,
    }
}

#[derive(Debug, Default)]
pub struct ExtractionResults {
    pub dividends: Vec<DividendRecord>,
    pub trades: Vec<TradeRecord>,
    pub summaries: Vec<SummaryRecord>,
    pub costs: Vec<CostRecord>,
}

#[derive(Debug, Tabled)]
struct WrittenCategory {
    category: String,
    records: String,
    file: String,
}

pub fn process_file(file: &PdfFile, loader: &dyn DocumentLoader, results: &mut ExtractionResults) {
    let Some(kind) = detect_document_kind(&file.name) else {
        info!("Skipping {} (unknown type)", file.name);
        return;
    };

    if let Some(limit) = size_limit_mb(kind) {
        if file.size_mb() > limit {
            info!("Skipping {} ({:.0}MB - too large)", file.name, file.size_mb());
            return;
        }
    }

    match kind {
        DocumentKind::Dividends => match extract_dividends(loader, &file.path) {
            Ok(records) => results.dividends.extend(records),
            Err(e) => warn!("Error processing {}: {}", file.name, e),
        },
        DocumentKind::Trades9a => results.trades.extend(extract_9a_trades(loader, &file.path)),
        DocumentKind::Summary16b => results
            .summaries
            .extend(extract_16b_summary(loader, &file.path)),
        DocumentKind::Costs => results.costs.extend(extract_costs(loader, &file.path)),
    }
}

pub fn process_files(files: &[PdfFile], loader: &dyn DocumentLoader) -> ExtractionResults {
    let mut results = ExtractionResults::default();
    for file in files {
        process_file(file, loader, &mut results);
    }
    results
}

fn write_category<T: serde::Serialize>(
    records: &[T],
    category: &str,
    output_path: PathBuf,
    written: &mut Vec<WrittenCategory>,
) -> anyhow::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    save_json(records, &output_path)?;
    info!("Saved {} records to {}", records.len(), output_path.display());
    written.push(WrittenCategory {
        category: category.to_string(),
        records: format_count(records.len()),
        file: output_path.display().to_string(),
    });
    Ok(())
}

/// Writes one JSON array per non-empty category. Returns the paths written.
pub fn write_results(results: &ExtractionResults, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = vec![];
    write_category(&results.dividends, "dividends", output_dir.join(DIVIDENDS_FILE), &mut written)?;
    write_category(&results.trades, "9A trades", output_dir.join(TRADES_FILE), &mut written)?;
    write_category(
        &results.summaries,
        "16B summaries",
        output_dir.join(SUMMARIES_FILE),
        &mut written,
    )?;
    write_category(&results.costs, "costs", output_dir.join(COSTS_FILE), &mut written)?;

    if !written.is_empty() {
        println!("{}", Table::new(&written));
    }
    Ok(written.into_iter().map(|w| PathBuf::from(w.file)).collect())
}

/// Runs the whole extraction over `input_dir` and writes the results to `output_dir`.
pub fn extract(
    input_dir: &Path,
    output_dir: &Path,
    loader: &dyn DocumentLoader,
) -> anyhow::Result<ExtractionResults> {
    let files = list_pdf_files(input_dir)?;
    println!("Found {} PDF files\n", format_count(files.len()));

    let results = process_files(&files, loader);

    println!();
    print_heading("Results");
    write_results(&results, output_dir)?;

    let total_style = Style::new().bold();
    println!(
        "\nTotal: {} dividends, {} trades, {} summaries, {} costs",
        format_count(results.dividends.len()).style(total_style),
        format_count(results.trades.len()).style(total_style),
        format_count(results.summaries.len()).style(total_style),
        format_count(results.costs.len()).style(total_style),
    );
    Ok(results)
}

pub fn run() -> anyhow::Result<()> {
    init_logger();
    let args = ExtractArgs::parse();

    if !args.input.exists() {
        eprintln!("Error: Input directory not found: {}", args.input.display());
        process::exit(1);
    }

    print_heading("Lynx PDF Extraction");
    println!("Input:  {}", args.input.display());
    println!("Output: {}\n", args.output.display());

    extract(&args.input, &args.output, &PdfExtractLoader)?;
    Ok(())
}
