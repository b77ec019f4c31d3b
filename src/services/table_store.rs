//! Whole-file CSV persistence for the price table.
//!
//! The archive is read in full before each ticker's merge and rewritten in
//! full afterwards; there is no partial or streaming access. Writes go to a
//! temp file first and are renamed into place, so an interrupted or failed
//! ticker leaves the existing artifact byte-identical.

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{PriceRecord, PriceTable};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentinel written when the provider could not supply an issuer name.
pub const NO_NAME: &str = "No name available";

const HEADER: [&str; 10] = [
    "Ticker",
    "Ticker FullName",
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Dividends",
    "Stock Splits",
];

/// Load the full price table from `path`.
///
/// A missing file is an empty table, not an error. An existing file that
/// does not parse back into records (wrong header, non-date date column,
/// non-numeric price fields) is a `TableCorrupt` hard failure; the caller
/// must not overwrite it.
pub fn load(path: &Path) -> Result<PriceTable> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::Io(format!("failed to open '{}': {}", path.display(), e)))?;

    let header = reader
        .headers()
        .map_err(|e| Error::TableCorrupt(format!("unreadable header: {}", e)))?;
    if header.iter().ne(HEADER) {
        return Err(Error::TableCorrupt(format!(
            "unexpected header '{}'",
            header.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut table = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2; // 1-based, after the header row
        let record =
            result.map_err(|e| Error::TableCorrupt(format!("row {}: {}", row_num, e)))?;

        table.push(parse_row(&record, row_num)?);
    }

    debug!(path = %path.display(), rows = table.len(), "Loaded price table");
    Ok(table)
}

/// Persist the full price table to `path`, atomically.
///
/// The table is written to a temp file first and renamed into place; on any
/// failure the temp file is removed and the existing artifact stays as-is.
pub fn save(path: &Path, table: &PriceTable) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");

    if let Err(e) = write_table(&tmp_path, table).and_then(|_| {
        std::fs::rename(&tmp_path, path).map_err(|e| {
            Error::Io(format!(
                "failed to move '{}' into place: {}",
                tmp_path.display(),
                e
            ))
        })
    }) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    debug!(path = %path.display(), rows = table.len(), "Saved price table");
    Ok(())
}

fn write_table(tmp_path: &Path, table: &PriceTable) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp_path)
        .map_err(|e| Error::Io(format!("failed to create '{}': {}", tmp_path.display(), e)))?;

    writer.write_record(HEADER)?;
    for record in table {
        writer.write_record(&[
            record.ticker.as_str(),
            record.name.as_deref().unwrap_or(NO_NAME),
            &record.date.format(DATE_FORMAT).to_string(),
            &record.open.to_string(),
            &record.high.to_string(),
            &record.low.to_string(),
            &record.close.to_string(),
            &record.volume.to_string(),
            &record.dividends.to_string(),
            &record.stock_splits.to_string(),
        ])?;
    }
    writer.flush().map_err(|e| Error::Io(e.to_string()))
}

fn parse_row(record: &csv::StringRecord, row_num: usize) -> Result<PriceRecord> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let ticker = field(0).to_string();
    if ticker.is_empty() {
        return Err(Error::TableCorrupt(format!("row {}: empty ticker", row_num)));
    }

    let name = match field(1) {
        "" | NO_NAME => None,
        other => Some(other.to_string()),
    };

    let date = NaiveDate::parse_from_str(field(2), DATE_FORMAT).map_err(|_| {
        Error::TableCorrupt(format!(
            "row {}: '{}' is not a {} date",
            row_num,
            field(2),
            DATE_FORMAT
        ))
    })?;

    let number = |idx: usize, label: &str| -> Result<f64> {
        field(idx).parse().map_err(|_| {
            Error::TableCorrupt(format!(
                "row {}: '{}' is not a numeric {}",
                row_num,
                field(idx),
                label
            ))
        })
    };

    let volume: u64 = field(7).parse().map_err(|_| {
        Error::TableCorrupt(format!(
            "row {}: '{}' is not a numeric Volume",
            row_num,
            field(7)
        ))
    })?;

    Ok(PriceRecord {
        ticker,
        name,
        date,
        open: number(3, "Open")?,
        high: number(4, "High")?,
        low: number(5, "Low")?,
        close: number(6, "Close")?,
        volume,
        dividends: number(8, "Dividends")?,
        stock_splits: number(9, "Stock Splits")?,
    })
}
