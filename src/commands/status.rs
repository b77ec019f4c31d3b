use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::models::PriceTable;
use crate::services::table_store;
use crate::utils;

pub fn run(config_override: Option<PathBuf>) {
    println!("📊 Price Archive Status\n");

    let config_path =
        config_override.unwrap_or_else(|| utils::exe_relative_path(utils::CONFIG_FILE));
    match show_status(&config_path) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn show_status(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;

    let output_path = utils::resolve_output_path(&config.output_file);

    let table = table_store::load(&output_path)?;
    if table.is_empty() {
        println!("⚠️  No archive at {} yet. Run 'tickerfetch fetch' first.", output_path.display());
        return Ok(());
    }

    let stats = ticker_stats(&table);
    println!("📈 {} rows across {} tickers\n", table.len(), stats.len());

    for stat in &stats {
        let name = stat.name.as_deref().unwrap_or(table_store::NO_NAME);
        println!("🔹 {} ({})", stat.ticker, name);
        println!(
            "   {:>8} rows  ({} → {})  latest close {:.2}",
            stat.rows, stat.first_date, stat.last_date, stat.last_close
        );
    }

    println!("\n💾 Archive: {}", output_path.display());
    Ok(())
}

struct TickerStats {
    ticker: String,
    name: Option<String>,
    rows: usize,
    first_date: NaiveDate,
    last_date: NaiveDate,
    last_close: f64,
}

/// Per-ticker row counts and date spans, in first-appearance order.
fn ticker_stats(table: &PriceTable) -> Vec<TickerStats> {
    let mut order = Vec::new();
    let mut by_ticker: HashMap<&str, TickerStats> = HashMap::new();

    for record in table {
        let stats = by_ticker
            .entry(record.ticker.as_str())
            .or_insert_with(|| {
                order.push(record.ticker.clone());
                TickerStats {
                    ticker: record.ticker.clone(),
                    name: record.name.clone(),
                    rows: 0,
                    first_date: record.date,
                    last_date: record.date,
                    last_close: record.close,
                }
            });

        stats.rows += 1;
        stats.first_date = stats.first_date.min(record.date);
        if record.date >= stats.last_date {
            stats.last_date = record.date;
            stats.last_close = record.close;
        }
        if stats.name.is_none() {
            stats.name = record.name.clone();
        }
    }

    order
        .iter()
        .filter_map(|ticker| by_ticker.remove(ticker.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRecord;

    fn record(ticker: &str, date_str: &str, close: f64) -> PriceRecord {
        PriceRecord {
            ticker: ticker.to_string(),
            name: None,
            date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    #[test]
    fn test_stats_follow_first_appearance_order() {
        let table = vec![
            record("XYZ", "2024-01-03", 50.0),
            record("ABC", "2024-01-02", 100.0),
            record("XYZ", "2024-01-04", 51.0),
            record("ABC", "2024-01-03", 101.0),
        ];

        let stats = ticker_stats(&table);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].ticker, "XYZ");
        assert_eq!(stats[0].rows, 2);
        assert_eq!(stats[0].last_close, 51.0);
        assert_eq!(stats[1].ticker, "ABC");
        assert_eq!(stats[1].first_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(stats[1].last_date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }
}
