use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    merge, table_store, ConsoleProgress, MarketDataClient, ProgressObserver, RunSummary,
    TickerOutcome, YahooClient,
};
use crate::utils;

pub fn run(config_override: Option<PathBuf>) {
    let config_path =
        config_override.unwrap_or_else(|| utils::exe_relative_path(utils::CONFIG_FILE));

    println!("📄 Loading configuration from {}", config_path.display());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("   Check the configuration file and the ticker list file.");
            std::process::exit(1);
        }
    };

    let output_path = utils::resolve_output_path(&config.output_file);
    println!(
        "🎯 {} tickers, lookback '{}', archive {}",
        config.tickers.len(),
        config.lookback_period,
        output_path.display()
    );

    let client = match YahooClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let summary = run_fetch(&config, &output_path, &client, &ConsoleProgress);
    println!("💾 Archive: {}", output_path.display());

    if !summary.any_succeeded() {
        std::process::exit(1);
    }
}

/// Process every configured ticker in order, sequentially.
///
/// Each ticker's failure is caught, recorded, and skipped; the remaining
/// tickers still run. A failed ticker never modifies the archive.
pub fn run_fetch(
    config: &Config,
    output_path: &Path,
    client: &dyn MarketDataClient,
    observer: &dyn ProgressObserver,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let total = config.tickers.len();

    for (index, ticker) in config.tickers.iter().enumerate() {
        observer.on_ticker_start(ticker, index, total);

        let outcome = match sync_ticker(ticker, &config.lookback_period, output_path, client) {
            Ok(0) => TickerOutcome::Unchanged,
            Ok(appended) => TickerOutcome::Updated { appended },
            Err(e) => {
                error!(ticker = %ticker, error = %e, "Ticker failed, continuing with the rest");
                TickerOutcome::Failed(e.to_string())
            }
        };

        match &outcome {
            TickerOutcome::Updated { .. } => summary.updated += 1,
            TickerOutcome::Unchanged => summary.unchanged += 1,
            TickerOutcome::Failed(_) => summary.failed.push(ticker.clone()),
        }
        observer.on_ticker_done(ticker, &outcome);
    }

    observer.on_run_complete(&summary);
    summary
}

/// Fetch one ticker, merge into the archive, persist. Returns the number of
/// appended rows. Nothing is written when the merge appends nothing, so an
/// up-to-date archive is untouched byte for byte.
fn sync_ticker(
    ticker: &str,
    lookback: &str,
    output_path: &Path,
    client: &dyn MarketDataClient,
) -> Result<usize> {
    let outcome = client.fetch(ticker, lookback)?;
    let existing = table_store::load(output_path)?;
    let before = existing.len();

    let merged = merge::merge(
        existing,
        &outcome.records,
        ticker,
        outcome.display_name.as_deref(),
    );
    let appended = merged.len() - before;

    if appended > 0 {
        table_store::save(output_path, &merged)?;
    }

    info!(ticker, appended, "Ticker synced");
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::FetchedRecord;
    use crate::services::FetchOutcome;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct StubClient {
        outcomes: HashMap<String, Vec<FetchedRecord>>,
    }

    impl MarketDataClient for StubClient {
        fn fetch(&self, ticker: &str, _lookback: &str) -> Result<FetchOutcome> {
            match self.outcomes.get(ticker) {
                Some(records) => Ok(FetchOutcome {
                    records: records.clone(),
                    display_name: None,
                }),
                None => Err(Error::NotFound(ticker.to_string())),
            }
        }
    }

    struct NullProgress;

    impl ProgressObserver for NullProgress {
        fn on_ticker_start(&self, _: &str, _: usize, _: usize) {}
        fn on_ticker_done(&self, _: &str, _: &TickerOutcome) {}
        fn on_run_complete(&self, _: &RunSummary) {}
    }

    fn fetched(date_str: &str) -> FetchedRecord {
        FetchedRecord {
            date: Some(NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1_000,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    fn test_config(tickers: &[&str]) -> Config {
        Config {
            output_file: "prices.csv".to_string(),
            lookback_period: "1y".to_string(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_run_fetch_builds_archive_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("prices.csv");
        let client = StubClient {
            outcomes: HashMap::from([
                ("ABC".to_string(), vec![fetched("2024-01-02"), fetched("2024-01-03")]),
                ("XYZ".to_string(), vec![fetched("2024-01-03")]),
            ]),
        };
        let config = test_config(&["ABC", "BAD", "XYZ"]);

        let summary = run_fetch(&config, &output_path, &client, &NullProgress);

        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failed, vec!["BAD"]);
        assert!(summary.any_succeeded());

        let table = table_store::load(&output_path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].ticker, "ABC");
        assert_eq!(table[2].ticker, "XYZ");
    }

    #[test]
    fn test_rerun_with_same_window_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("prices.csv");
        let client = StubClient {
            outcomes: HashMap::from([(
                "ABC".to_string(),
                vec![fetched("2024-01-02"), fetched("2024-01-03")],
            )]),
        };
        let config = test_config(&["ABC"]);

        run_fetch(&config, &output_path, &client, &NullProgress);
        let first = std::fs::read_to_string(&output_path).unwrap();

        let summary = run_fetch(&config, &output_path, &client, &NullProgress);
        let second = std::fs::read_to_string(&output_path).unwrap();

        assert_eq!(summary.unchanged, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_ticker_leaves_archive_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("prices.csv");
        let seed_client = StubClient {
            outcomes: HashMap::from([("ABC".to_string(), vec![fetched("2024-01-02")])]),
        };
        run_fetch(
            &test_config(&["ABC"]),
            &output_path,
            &seed_client,
            &NullProgress,
        );
        let before = std::fs::read_to_string(&output_path).unwrap();

        // Second run: the only ticker fails at fetch time
        let failing_client = StubClient {
            outcomes: HashMap::new(),
        };
        let summary = run_fetch(
            &test_config(&["ABC"]),
            &output_path,
            &failing_client,
            &NullProgress,
        );

        assert!(!summary.any_succeeded());
        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), before);
    }

    #[test]
    fn test_corrupt_archive_fails_ticker_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("prices.csv");
        let corrupt = "Ticker,Ticker FullName,Date,Open,High,Low,Close,Volume,Dividends,Stock Splits\n\
                       ABC,No name available,garbage,1,2,0.5,1.5,100,0,0\n";
        std::fs::write(&output_path, corrupt).unwrap();

        let client = StubClient {
            outcomes: HashMap::from([("ABC".to_string(), vec![fetched("2024-01-02")])]),
        };
        let summary = run_fetch(&test_config(&["ABC"]), &output_path, &client, &NullProgress);

        assert_eq!(summary.failed, vec!["ABC"]);
        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), corrupt);
    }
}
