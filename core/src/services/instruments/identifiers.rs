//! Translation of Interactive Brokers (Lynx) symbols into Yahoo Finance tickers.

use once_cell::sync::Lazy;
use regex::Regex;

static PREFERRED_SHARE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)-PR([A-Z])$").unwrap());

/// IB exchange code to Yahoo suffix. US venues carry no suffix.
pub const EXCHANGE_SUFFIX: &[(&str, &str)] = &[
    ("HEX", ".HE"),
    ("SFB", ".ST"),
    ("OSE", ".OL"),
    ("TSE", ".TO"),
    ("TSEJ", ".T"),
    ("SBF", ".PA"),
    ("FWB", ".F"),
    // FWB2 is Xetra at IB, but Yahoo has better coverage on .F
    ("FWB2", ".F"),
    ("IBIS", ".DE"),
    ("LSE", ".L"),
    ("SEHK", ".HK"),
    ("NYSE", ""),
    ("NASDAQ", ""),
    ("ARCA", ""),
    ("AMEX", ""),
];

const US_EXCHANGES: [&str; 4] = ["NYSE", "NASDAQ", "AMEX", "ARCA"];

/// (IB symbol, exchange) pairs that the rules below get wrong or that Yahoo lists elsewhere.
pub const SYMBOL_OVERRIDES: &[((&str, &str), &str)] = &[
    // Oslo "o" suffix
    (("EQNRo", "OSE"), "EQNR.OL"),
    (("FROo", "OSE"), "FRO.OL"),
    (("NHYo", "OSE"), "NHY.OL"),
    (("YARo", "OSE"), "YAR.OL"),
    // Hong Kong, zero padded
    (("11", "SEHK"), "0011.HK"),
    (("669", "SEHK"), "0669.HK"),
    (("700", "SEHK"), "0700.HK"),
    (("916", "SEHK"), "0916.HK"),
    // Toronto REIT units
    (("SGR.UN", "TSE"), "SGR-UN.TO"),
    (("AD.UN", "TSE"), "AD-UN.TO"),
    (("AP.UN", "TSE"), "AP-UN.TO"),
    // US preferred shares
    (("RNR PRF", "NYSE"), "RNR-PF"),
    (("CIM PRA", "NYSE"), "CIM-PA"),
    (("CIM PRB", "NYSE"), "CIM-PB"),
    // Helsinki short codes
    (("KEK", "HEX"), "KESKOB.HE"),
    (("FOT", "HEX"), "FORTUM.HE"),
    (("04Q", "HEX"), "NDA-FI.HE"),
    (("N2S", "HEX"), "MANTA.HE"),
    (("RPL", "HEX"), "UPM.HE"),
    (("OUTA", "HEX"), "OUT1V.HE"),
    (("OFK", "HEX"), "ORNBV.HE"),
    (("NEF", "HEX"), "NESTE.HE"),
    (("TLS", "HEX"), "TELIA1.HE"),
    (("2A41", "HEX"), "AKTIA.HE"),
    (("STEAVh", "HEX"), "STEAV.HE"),
    (("TOKMAh", "HEX"), "TOKMAN.HE"),
    (("TTEB", "HEX"), "TIETO.HE"),
    // Frankfurt listings mapped to the primary exchange
    (("RAUA", "FWB"), "RAUTE.HE"),
    (("TELIA1", "FWB"), "TELIA1.HE"),
    (("BEW", "FWB2"), "BEW.F"),
    (("GKE", "FWB2"), "GKE.F"),
    (("CVZ", "FWB2"), "CVZ.F"),
    // delisted or renamed, Yahoo still serves the old ticker
    (("GOGL", "NASDAQ"), "GOGL"),
    (("PTMN", "NASDAQ"), "PTMN"),
];

pub fn get_symbol_override(ib_symbol: &str, exchange: &str) -> Option<&'static str> {
    SYMBOL_OVERRIDES
        .iter()
        .find(|((symbol, exch), _)| *symbol == ib_symbol && *exch == exchange)
        .map(|(_, yahoo_symbol)| *yahoo_symbol)
}

pub fn get_exchange_suffix(exchange: &str) -> &'static str {
    EXCHANGE_SUFFIX
        .iter()
        .find(|(exch, _)| *exch == exchange)
        .map(|(_, suffix)| *suffix)
        .unwrap_or("")
}

fn strip_trailing(symbol: String, marker: char) -> String {
    if symbol.chars().count() > 1 && symbol.ends_with(marker) {
        symbol[..symbol.len() - marker.len_utf8()].to_string()
    } else {
        symbol
    }
}

fn has_known_suffix(symbol: &str) -> bool {
    symbol.contains('.')
        && EXCHANGE_SUFFIX
            .iter()
            .any(|(_, suffix)| !suffix.is_empty() && symbol.ends_with(suffix))
}

/// Converts an IB symbol and listing exchange into the ticker Yahoo Finance expects.
///
/// Overrides win over every rule. Otherwise spaces become hyphens, the Oslo `o` and
/// Helsinki `h` class markers are dropped, Hong Kong codes are padded to four digits,
/// Toronto `.UN` units become `-UN` and US preferred `-PRx` becomes `-Px`. Symbols that
/// already carry a Yahoo suffix are not suffixed again.
pub fn get_yahoo_symbol(ib_symbol: &str, exchange: &str) -> String {
    if let Some(yahoo_symbol) = get_symbol_override(ib_symbol, exchange) {
        return yahoo_symbol.to_string();
    }

    let suffix = get_exchange_suffix(exchange);
    let mut symbol = ib_symbol.replace(' ', "-");

    match exchange {
        "OSE" => symbol = strip_trailing(symbol, 'o'),
        "HEX" => symbol = strip_trailing(symbol, 'h'),
        "SEHK" if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_digit()) => {
            symbol = format!("{:0>4}", symbol)
        }
        "TSE" => symbol = symbol.replace(".UN", "-UN"),
        _ if US_EXCHANGES.contains(&exchange) => {
            if let Some(caps) = PREFERRED_SHARE_PATTERN.captures(&symbol) {
                symbol = format!("{}-P{}", &caps[1], &caps[2]);
            }
        }
        _ => {}
    }

    if has_known_suffix(&symbol) {
        return symbol;
    }
    format!("{}{}", symbol, suffix)
}
