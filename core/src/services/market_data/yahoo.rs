//! Yahoo Finance client.
//!
//! Dividends and prices come from the v8 chart endpoint, profiles from v10 quoteSummary,
//! which needs a session cookie and crumb.

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate};
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::provider::{DividendEvent, DividendHistory, MarketDataProvider, PriceBar, ProfileInfo};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const PROFILE_MODULES: &str = "price,summaryProfile,summaryDetail,financialData";

pub struct YahooClient {
    client: Client,
    crumb: OnceCell<String>,
}

impl YahooClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            crumb: OnceCell::new(),
        })
    }

    async fn get_json(&self, url: &str, symbol: &str) -> anyhow::Result<Value> {
        debug!("Requesting {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request failed for {}: {}", symbol, e))?;

        let status = response.status();
        let body = response.text().await?;
        // Yahoo answers unknown symbols with a 404 carrying a regular error payload
        serde_json::from_str::<Value>(&body)
            .map_err(|e| anyhow!("HTTP {} for {}: {} ({})", status, symbol, e, body))
    }

    async fn fetch_chart(&self, symbol: &str) -> anyhow::Result<Option<Value>> {
        let url = format!(
            "{}/{}?range=max&interval=1d&events=div",
            CHART_URL,
            urlencoding::encode(symbol)
        );
        let data = self.get_json(&url, symbol).await?;
        check_chart_error(symbol, &data)
    }

    async fn crumb(&self) -> anyhow::Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // only sets the session cookie, the status is irrelevant
                let _ = self.client.get(COOKIE_URL).send().await;
                let crumb = self.client.get(CRUMB_URL).send().await?.text().await?;
                if crumb.is_empty() || crumb.contains('<') {
                    return Err(anyhow!("Yahoo did not hand out a crumb"));
                }
                Ok::<String, anyhow::Error>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }
}

impl MarketDataProvider for YahooClient {
    async fn dividends(&self, symbol: &str) -> anyhow::Result<Option<DividendHistory>> {
        Ok(self
            .fetch_chart(symbol)
            .await?
            .and_then(|data| parse_dividend_history(&data)))
    }

    async fn history(&self, symbol: &str) -> anyhow::Result<Vec<PriceBar>> {
        Ok(self
            .fetch_chart(symbol)
            .await?
            .map(|data| parse_price_bars(&data))
            .unwrap_or_default())
    }

    async fn profile(&self, symbol: &str) -> anyhow::Result<Option<ProfileInfo>> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{}/{}?modules={}&crumb={}",
            QUOTE_SUMMARY_URL,
            urlencoding::encode(symbol),
            PROFILE_MODULES,
            urlencoding::encode(crumb)
        );
        let data = self.get_json(&url, symbol).await?;
        if let Some(error) = data
            .get("quoteSummary")
            .and_then(|q| q.get("error"))
            .filter(|e| e.is_object())
        {
            let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("unknown");
            if code == "Not Found" {
                return Ok(None);
            }
            let desc = error
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("No description");
            return Err(anyhow!("Yahoo API error for {}: {} - {}", symbol, code, desc));
        }
        Ok(parse_profile(&data))
    }
}

/// `Ok(None)` for unknown symbols, an error for any other Yahoo error payload.
pub fn check_chart_error(symbol: &str, data: &Value) -> anyhow::Result<Option<Value>> {
    if let Some(error) = data
        .get("chart")
        .and_then(|c| c.get("error"))
        .and_then(|e| e.as_object())
    {
        let code = error.get("code").and_then(|c| c.as_str()).unwrap_or("unknown");
        if code == "Not Found" {
            return Ok(None);
        }
        let desc = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("No description");
        return Err(anyhow!("Yahoo API error for {}: {} - {}", symbol, code, desc));
    }
    Ok(Some(data.clone()))
}

fn chart_result(data: &Value) -> Option<&Value> {
    data.get("chart")
        .and_then(|c| c.get("result"))
        .and_then(|r| r.get(0))
}

// Dates are taken in the exchange's local time, otherwise Asian sessions land on the
// previous day in UTC.
fn local_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

fn gmt_offset(chart: &Value) -> i64 {
    chart
        .get("meta")
        .and_then(|m| m.get("gmtoffset"))
        .and_then(|o| o.as_i64())
        .unwrap_or(0)
}

pub fn parse_dividend_history(data: &Value) -> Option<DividendHistory> {
    let chart = chart_result(data)?;
    let offset = gmt_offset(chart);
    let currency = chart
        .get("meta")
        .and_then(|m| m.get("currency"))
        .and_then(|c| c.as_str())
        .map(String::from);

    let mut events: Vec<DividendEvent> = chart
        .get("events")
        .and_then(|e| e.get("dividends"))
        .and_then(|d| d.as_object())
        .map(|dividends| {
            dividends
                .values()
                .filter_map(|dividend| {
                    let timestamp = dividend.get("date").and_then(|d| d.as_i64())?;
                    let amount = dividend.get("amount").and_then(|a| a.as_f64())?;
                    Some(DividendEvent {
                        date: local_date(timestamp, offset)?,
                        amount,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    events.sort_by_key(|event| event.date);

    Some(DividendHistory { currency, events })
}

pub fn parse_price_bars(data: &Value) -> Vec<PriceBar> {
    let Some(chart) = chart_result(data) else {
        return vec![];
    };
    let offset = gmt_offset(chart);
    let Some(timestamps) = chart.get("timestamp").and_then(|t| t.as_array()) else {
        return vec![];
    };
    let quote = chart
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.get(0));
    let series = |name: &str| quote.and_then(|q| q.get(name)).and_then(|s| s.as_array());
    let (opens, highs, lows, closes, volumes) = (
        series("open"),
        series("high"),
        series("low"),
        series("close"),
        series("volume"),
    );
    let value_at = |values: Option<&Vec<Value>>, i: usize| {
        values.and_then(|arr| arr.get(i)).and_then(|v| v.as_f64())
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = local_date(ts.as_i64()?, offset)?;
            Some(PriceBar {
                date,
                open: value_at(opens, i),
                high: value_at(highs, i),
                low: value_at(lows, i),
                close: value_at(closes, i),
                volume: volumes.and_then(|arr| arr.get(i)).and_then(|v| v.as_u64()),
            })
        })
        .collect()
}

/// quoteSummary wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`.
fn raw_value<'a>(module: Option<&'a Value>, field: &str) -> Option<&'a Value> {
    let value = module?.get(field)?;
    match value.get("raw") {
        Some(raw) => Some(raw),
        None if value.is_number() => Some(value),
        None => None,
    }
}

fn raw_f64(module: Option<&Value>, field: &str) -> Option<f64> {
    raw_value(module, field).and_then(|v| v.as_f64())
}

fn raw_i64(module: Option<&Value>, field: &str) -> Option<i64> {
    raw_value(module, field).and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

fn text(module: Option<&Value>, field: &str) -> Option<String> {
    module?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn parse_profile(data: &Value) -> Option<ProfileInfo> {
    let result = data
        .get("quoteSummary")
        .and_then(|q| q.get("result"))
        .and_then(|r| r.get(0))
        .filter(|r| r.as_object().is_some_and(|o| !o.is_empty()))?;

    let price = result.get("price");
    let profile = result.get("summaryProfile");
    let detail = result.get("summaryDetail");
    let financial = result.get("financialData");

    Some(ProfileInfo {
        name: text(price, "longName").or_else(|| text(price, "shortName")),
        sector: text(profile, "sector"),
        industry: text(profile, "industry"),
        country: text(profile, "country"),
        currency: text(price, "currency").or_else(|| text(detail, "currency")),
        market_cap: raw_i64(price, "marketCap").or_else(|| raw_i64(detail, "marketCap")),
        dividend_rate: raw_f64(detail, "dividendRate"),
        dividend_yield: raw_f64(detail, "dividendYield"),
        ex_dividend_date: raw_i64(detail, "exDividendDate"),
        payout_ratio: raw_f64(detail, "payoutRatio"),
        trailing_pe: raw_f64(detail, "trailingPE"),
        forward_pe: raw_f64(detail, "forwardPE"),
        price: raw_f64(financial, "currentPrice")
            .or_else(|| raw_f64(price, "regularMarketPrice")),
        fifty_two_week_high: raw_f64(detail, "fiftyTwoWeekHigh"),
        fifty_two_week_low: raw_f64(detail, "fiftyTwoWeekLow"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_fixture() -> Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "currency": "EUR", "gmtoffset": 7200 },
                    "timestamp": [1704783600, 1704870000, 1704956400],
                    "events": {
                        "dividends": {
                            "1712296800": { "amount": 1.02, "date": 1712296800 },
                            "1680847200": { "amount": 1.06, "date": 1680847200 }
                        }
                    },
                    "indicators": {
                        "quote": [{
                            "open": [18.5, 18.7, null],
                            "high": [18.9, 18.95, null],
                            "low": [18.3, 18.6, null],
                            "close": [18.66, 18.8, null],
                            "volume": [512000, 430100, null]
                        }]
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_parse_dividend_history() {
        let history = parse_dividend_history(&chart_fixture()).unwrap();
        assert_eq!(history.currency.as_deref(), Some("EUR"));
        assert_eq!(history.events.len(), 2);
        assert_eq!(
            history.events[0].date,
            NaiveDate::from_ymd_opt(2023, 4, 7).unwrap()
        );
        assert_eq!(history.events[0].amount, 1.06);
        assert_eq!(
            history.events[1].date,
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_parse_dividend_history_without_events() {
        let data = json!({ "chart": { "result": [{ "meta": {} }], "error": null } });
        let history = parse_dividend_history(&data).unwrap();
        assert!(history.events.is_empty());
        assert_eq!(history.currency, None);
    }

    #[test]
    fn test_parse_price_bars() {
        let bars = parse_price_bars(&chart_fixture());
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(bars[0].close, Some(18.66));
        assert_eq!(bars[1].volume, Some(430100));
        assert_eq!(bars[2].close, None);
    }

    #[test]
    fn test_check_chart_error() {
        let not_found = json!({
            "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" } }
        });
        assert!(check_chart_error("NOPE", &not_found).unwrap().is_none());

        let bad_request = json!({
            "chart": { "result": null, "error": { "code": "Bad Request", "description": "Invalid input" } }
        });
        assert!(check_chart_error("NOPE", &bad_request).is_err());

        assert!(check_chart_error("KESKOB.HE", &chart_fixture()).unwrap().is_some());
    }

    #[test]
    fn test_parse_profile() {
        let data = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "Kesko Oyj",
                        "shortName": "Kesko B",
                        "currency": "EUR",
                        "marketCap": { "raw": 7712345600i64, "fmt": "7.71B" },
                        "regularMarketPrice": { "raw": 19.2, "fmt": "19.20" }
                    },
                    "summaryProfile": {
                        "sector": "Consumer Defensive",
                        "industry": "Grocery Stores",
                        "country": "Finland"
                    },
                    "summaryDetail": {
                        "dividendRate": { "raw": 1.08, "fmt": "1.08" },
                        "dividendYield": { "raw": 0.0562, "fmt": "5.62%" },
                        "exDividendDate": { "raw": 1712275200, "fmt": "2024-04-05" },
                        "payoutRatio": { "raw": 0.91, "fmt": "91.00%" },
                        "trailingPE": { "raw": 16.3, "fmt": "16.30" },
                        "forwardPE": {},
                        "fiftyTwoWeekHigh": { "raw": 21.0, "fmt": "21.00" },
                        "fiftyTwoWeekLow": { "raw": 16.2, "fmt": "16.20" }
                    },
                    "financialData": {}
                }],
                "error": null
            }
        });
        let profile = parse_profile(&data).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Kesko Oyj"));
        assert_eq!(profile.country.as_deref(), Some("Finland"));
        assert_eq!(profile.market_cap, Some(7712345600));
        assert_eq!(profile.ex_dividend_date, Some(1712275200));
        assert_eq!(profile.forward_pe, None);
        // falls back to the market price when financialData has no current price
        assert_eq!(profile.price, Some(19.2));
    }

    #[test]
    fn test_parse_profile_empty_result() {
        let data = json!({ "quoteSummary": { "result": [], "error": null } });
        assert!(parse_profile(&data).is_none());
        let data = json!({ "quoteSummary": { "result": [{}], "error": null } });
        assert!(parse_profile(&data).is_none());
    }
}
