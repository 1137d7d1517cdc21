pub const DEFAULT_PDF_INPUT_DIR: &str = "csv_data/archive/Lynx";
pub const DEFAULT_PDF_OUTPUT_DIR: &str = "data_revisited/lynx";
pub const DEFAULT_DATA_DIR: &str = "csv_data";

pub const DIVIDENDS_DIR: &str = "dividends";
pub const HISTORY_DIR: &str = "history";
pub const PROFILES_DIR: &str = "profiles";

pub const DIVIDENDS_FILE: &str = "dividends.json";
pub const TRADES_FILE: &str = "9a_trades.json";
pub const SUMMARIES_FILE: &str = "16b_summaries.json";
pub const COSTS_FILE: &str = "costs.json";

// 9A reports above this size take too long, the CSV export covers them instead
pub const MAX_TRADE_REPORT_MB: f64 = 50.0;
pub const MAX_SUMMARY_REPORT_MB: f64 = 30.0;
