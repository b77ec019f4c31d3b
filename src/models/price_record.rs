use chrono::NaiveDate;

/// One persisted row: one ticker on one calendar date.
///
/// The numeric fields are whatever the provider returned for that day; the
/// merge engine copies them without inspecting their values.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// Ticker symbol, case-preserving as supplied by the user
    pub ticker: String,

    /// Issuer display name, when the provider could supply one
    pub name: Option<String>,

    /// Calendar date (provider timestamps are truncated to date)
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume (number of shares)
    pub volume: u64,

    /// Dividend paid on this date, 0.0 when none
    pub dividends: f64,

    /// Split ratio applied on this date, 0.0 when none
    pub stock_splits: f64,
}

/// One freshly fetched row, before it is attributed to a ticker.
///
/// The date stays optional here: a provider timestamp that cannot be
/// converted to a calendar date must survive to the merge engine, which
/// excludes such rows rather than guessing.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRecord {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub dividends: f64,
    pub stock_splits: f64,
}

impl FetchedRecord {
    /// Convert to a persisted record for `ticker`.
    ///
    /// Returns `None` when the fetched row has no usable date.
    pub fn to_price_record(&self, ticker: &str, name: Option<&str>) -> Option<PriceRecord> {
        let date = self.date?;
        Some(PriceRecord {
            ticker: ticker.to_string(),
            name: name.map(str::to_string),
            date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            dividends: self.dividends,
            stock_splits: self.stock_splits,
        })
    }
}
