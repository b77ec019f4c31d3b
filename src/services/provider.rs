//! Market-data client boundary and progress reporting.
//!
//! The fetch loop talks to these traits only, so the concrete Yahoo client
//! can be swapped for a stub in tests and the console reporter for any other
//! status surface.

use crate::error::Result;
use crate::models::FetchedRecord;

/// Result of a successful fetch for a single ticker.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Ordered daily records covering the requested lookback window
    pub records: Vec<FetchedRecord>,

    /// Issuer display name, when the provider supplied one
    pub display_name: Option<String>,
}

/// Boundary to the external market-data provider.
pub trait MarketDataClient {
    /// Fetch daily history for `ticker` over `lookback` (provider
    /// vocabulary, e.g. "1y" or "max").
    fn fetch(&self, ticker: &str, lookback: &str) -> Result<FetchOutcome>;
}

/// What happened to one ticker during a run.
#[derive(Debug, Clone)]
pub enum TickerOutcome {
    /// New rows were appended to the archive
    Updated { appended: usize },
    /// Fetch succeeded but brought nothing past the watermark
    Unchanged,
    /// Fetch or merge failed; the archive was left untouched
    Failed(String),
}

/// Tally of a whole run, driving the final status line and exit code.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.updated + self.unchanged + self.failed.len()
    }

    /// True when at least one ticker made it through.
    pub fn any_succeeded(&self) -> bool {
        self.updated + self.unchanged > 0
    }
}

/// One-way status surface notified as the run progresses.
pub trait ProgressObserver {
    fn on_ticker_start(&self, ticker: &str, index: usize, total: usize);
    fn on_ticker_done(&self, ticker: &str, outcome: &TickerOutcome);
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Console implementation of the status surface.
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_ticker_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] 📥 Fetching {}...", index + 1, total, ticker);
    }

    fn on_ticker_done(&self, ticker: &str, outcome: &TickerOutcome) {
        match outcome {
            TickerOutcome::Updated { appended } => {
                println!("   ✅ {}: {} new rows", ticker, appended);
            }
            TickerOutcome::Unchanged => {
                println!("   ✅ {}: already up to date", ticker);
            }
            TickerOutcome::Failed(reason) => {
                eprintln!("   ❌ {}: {} (skipped)", ticker, reason);
            }
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!();
        if summary.failed.is_empty() {
            println!(
                "✅ Data updated: {} tickers processed ({} with new rows)",
                summary.processed(),
                summary.updated
            );
        } else if summary.any_succeeded() {
            println!(
                "⚠️  Completed with {} failures: {}",
                summary.failed.len(),
                summary.failed.join(", ")
            );
        } else {
            eprintln!("❌ All tickers failed; archive untouched");
        }
    }
}
