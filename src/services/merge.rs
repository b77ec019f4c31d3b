//! Incremental merge engine.
//!
//! Decides which freshly fetched records for a ticker are genuinely new
//! relative to the persisted table, and appends exactly those. Repeated
//! merges over overlapping fetch windows are idempotent: no (ticker, date)
//! pair is ever duplicated and nothing strictly newer is ever dropped.
//!
//! Appends only. Retroactive changes to already-persisted historical values
//! (e.g. adjusted-close restatements) are intentionally not detected.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{FetchedRecord, PriceTable};

/// Most recent persisted date for `ticker`, used as the append cutoff.
///
/// When the ticker has never been persisted this is the Unix epoch, older
/// than any real market date, so every dated fetch row qualifies as new.
pub fn watermark(existing: &PriceTable, ticker: &str) -> NaiveDate {
    existing
        .iter()
        .filter(|record| record.ticker == ticker)
        .map(|record| record.date)
        .max()
        .unwrap_or_default() // NaiveDate::default() is 1970-01-01
}

/// Merge `fresh` records for `ticker` into `existing`.
///
/// Appends, in fetch order, exactly the fresh records dated strictly after
/// the ticker's watermark. Rows without a usable date are excluded: a record
/// whose date cannot be determined must never be re-appended. Records for
/// other tickers pass through untouched and in their original order.
pub fn merge(
    mut existing: PriceTable,
    fresh: &[FetchedRecord],
    ticker: &str,
    display_name: Option<&str>,
) -> PriceTable {
    let cutoff = watermark(&existing, ticker);
    let mut appended = 0;

    for record in fresh {
        let Some(price) = record.to_price_record(ticker, display_name) else {
            warn!(ticker, "Skipping fetched record with no usable date");
            continue;
        };
        if price.date > cutoff {
            existing.push(price);
            appended += 1;
        }
    }

    debug!(
        ticker,
        %cutoff,
        fetched = fresh.len(),
        appended,
        "Merged fetch into price table"
    );

    existing
}
