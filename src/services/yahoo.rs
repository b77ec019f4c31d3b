//! Yahoo Finance market-data client.
//!
//! Fetches daily price history from Yahoo's v8 chart API with a blocking
//! HTTP client. One request per ticker; failures surface per ticker and the
//! run loop decides what to do with them. Yahoo has no official API and the
//! response format can change without notice.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::FetchedRecord;
use crate::services::provider::{FetchOutcome, MarketDataClient};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct Events {
    dividends: Option<HashMap<String, DividendEvent>>,
    splits: Option<HashMap<String, SplitEvent>>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

/// Blocking Yahoo Finance client.
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn chart_url(&self, ticker: &str, lookback: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&events=div%7Csplit",
            self.base_url, ticker, lookback
        )
    }
}

impl MarketDataClient for YahooClient {
    fn fetch(&self, ticker: &str, lookback: &str) -> Result<FetchOutcome> {
        let url = self.chart_url(ticker, lookback);
        debug!(ticker, lookback, "Requesting chart data");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::Network(format!("{}: {}", ticker, e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Network(format!("HTTP {} for {}", status, ticker)));
        }

        let chart: ChartResponse = resp
            .json()
            .map_err(|e| Error::Parse(format!("response for {}: {}", ticker, e)))?;

        parse_chart(ticker, chart)
    }
}

/// Convert a chart response into ordered fetched records plus the issuer
/// display name.
fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<FetchOutcome> {
    let result = match (resp.chart.result, resp.chart.error) {
        (Some(result), _) => result,
        (None, Some(err)) if err.code == "Not Found" => {
            return Err(Error::NotFound(ticker.to_string()))
        }
        (None, Some(err)) => {
            return Err(Error::Parse(format!("{}: {}", err.code, err.description)))
        }
        (None, None) => return Err(Error::Parse("empty result with no error".to_string())),
    };

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("result array is empty".to_string()))?;

    let display_name = data.meta.long_name.or(data.meta.short_name);

    let timestamps = data
        .timestamp
        .ok_or_else(|| Error::Parse(format!("no timestamps for {}", ticker)))?;

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse(format!("no quote data for {}", ticker)))?;

    let (dividends, splits) = event_maps(data.events);

    let mut records = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        // Rows where every quote field is null are non-trading days
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        let date = timestamp_to_date(ts);

        records.push(FetchedRecord {
            date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.unwrap_or(0),
            dividends: date.and_then(|d| dividends.get(&d).copied()).unwrap_or(0.0),
            stock_splits: date.and_then(|d| splits.get(&d).copied()).unwrap_or(0.0),
        });
    }

    if records.is_empty() {
        return Err(Error::NotFound(ticker.to_string()));
    }

    Ok(FetchOutcome {
        records,
        display_name,
    })
}

/// Index dividend and split events by the calendar date they apply to.
fn event_maps(events: Option<Events>) -> (HashMap<NaiveDate, f64>, HashMap<NaiveDate, f64>) {
    let mut dividends = HashMap::new();
    let mut splits = HashMap::new();

    if let Some(events) = events {
        for event in events.dividends.unwrap_or_default().into_values() {
            if let Some(date) = timestamp_to_date(event.date) {
                dividends.insert(date, event.amount);
            }
        }
        for event in events.splits.unwrap_or_default().into_values() {
            if let Some(date) = timestamp_to_date(event.date) {
                if event.denominator != 0.0 {
                    splits.insert(date, event.numerator / event.denominator);
                }
            }
        }
    }

    (dividends, splits)
}

/// Truncate a provider timestamp to a UTC calendar date.
fn timestamp_to_date(ts: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(date_str: &str) -> i64 {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn chart_response(body: serde_json::Value) -> ChartResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_parse_chart_records_and_name() {
        let resp = chart_response(serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "longName": "Abc Corporation", "shortName": "Abc" },
                    "timestamp": [ts("2024-01-02"), ts("2024-01-03")],
                    "indicators": {
                        "quote": [{
                            "open": [10.0, 10.5],
                            "high": [10.8, 11.0],
                            "low": [9.9, 10.2],
                            "close": [10.5, 10.9],
                            "volume": [1000, 1100]
                        }]
                    },
                    "events": {
                        "dividends": {
                            "1704292200": { "amount": 0.25, "date": ts("2024-01-03") }
                        }
                    }
                }],
                "error": null
            }
        }));

        let outcome = parse_chart("ABC", resp).unwrap();

        assert_eq!(outcome.display_name.as_deref(), Some("Abc Corporation"));
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.records[0].date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
        assert_eq!(outcome.records[0].dividends, 0.0);
        assert_eq!(outcome.records[1].close, 10.9);
        assert_eq!(outcome.records[1].dividends, 0.25);
    }

    #[test]
    fn test_parse_chart_skips_all_null_rows() {
        let resp = chart_response(serde_json::json!({
            "chart": {
                "result": [{
                    "meta": {},
                    "timestamp": [ts("2024-01-02"), ts("2024-01-03")],
                    "indicators": {
                        "quote": [{
                            "open": [10.0, null],
                            "high": [10.8, null],
                            "low": [9.9, null],
                            "close": [10.5, null],
                            "volume": [1000, null]
                        }]
                    }
                }],
                "error": null
            }
        }));

        let outcome = parse_chart("ABC", resp).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.display_name, None);
    }

    #[test]
    fn test_parse_chart_unknown_symbol() {
        let resp = chart_response(serde_json::json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found" }
            }
        }));

        let err = parse_chart("NOPE", resp).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[test]
    fn test_split_ratio_from_event() {
        let resp = chart_response(serde_json::json!({
            "chart": {
                "result": [{
                    "meta": {},
                    "timestamp": [ts("2024-01-02")],
                    "indicators": {
                        "quote": [{
                            "open": [10.0],
                            "high": [10.8],
                            "low": [9.9],
                            "close": [10.5],
                            "volume": [1000]
                        }]
                    },
                    "events": {
                        "splits": {
                            "1704205800": { "date": ts("2024-01-02"), "numerator": 4.0, "denominator": 1.0 }
                        }
                    }
                }],
                "error": null
            }
        }));

        let outcome = parse_chart("ABC", resp).unwrap();
        assert_eq!(outcome.records[0].stock_splits, 4.0);
    }
}
