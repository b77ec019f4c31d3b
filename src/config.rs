//! Configuration schema and loader.
//!
//! The config file is INI-shaped: `[section]` headers group `key=value` or
//! `key:value` lines, `#`/`;` start comments, and a value containing a comma
//! is an ordered list. Sections only group; keys are recognized regardless of
//! which section they appear in. All keys are validated here, at load time,
//! so a typo fails the run before any fetch happens.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};
use crate::services::tickers;

/// Lookback specifiers understood by the provider's range parameter.
pub const VALID_LOOKBACKS: [&str; 11] = [
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

const KEY_OUTPUT_FILE: &str = "OUTPUT_FILE";
const KEY_LOOKBACK_PERIOD: &str = "LOOKBACK_PERIOD";
const KEY_TICKERS: &str = "TICKERS";
const KEY_TICKER_FILE: &str = "TICKER_FILE";

const DEFAULT_LOOKBACK: &str = "1y";

/// Immutable process-wide settings, loaded once at startup and passed by
/// parameter to every collaborator that needs them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Archive file name or path (relative paths resolve next to the binary)
    pub output_file: String,

    /// Provider lookback specifier, e.g. "1y" or "max"
    pub lookback_period: String,

    /// Ordered ticker symbols to process
    pub tickers: Vec<String>,
}

/// A raw value as it appears in the file.
#[derive(Debug, Clone)]
enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl Config {
    /// Load and validate the configuration file at `path`.
    ///
    /// A missing or unparsable file, a missing required key, an unknown
    /// lookback specifier, or an empty ticker list are all startup-fatal
    /// `Config` errors.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file '{}' does not exist",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read '{}': {}", path.display(), e)))?;
        let raw = parse_ini(&contents)?;

        for key in raw.keys() {
            if ![KEY_OUTPUT_FILE, KEY_LOOKBACK_PERIOD, KEY_TICKERS, KEY_TICKER_FILE]
                .contains(&key.as_str())
            {
                warn!(key = %key, "Ignoring unknown configuration key");
            }
        }

        let output_file = match raw.get(KEY_OUTPUT_FILE) {
            Some(RawValue::Scalar(s)) if !s.is_empty() => s.clone(),
            Some(_) => {
                return Err(Error::Config(format!(
                    "{} must be a single non-empty file name",
                    KEY_OUTPUT_FILE
                )))
            }
            None => {
                return Err(Error::Config(format!(
                    "missing required key {}",
                    KEY_OUTPUT_FILE
                )))
            }
        };

        let lookback_period = match raw.get(KEY_LOOKBACK_PERIOD) {
            Some(RawValue::Scalar(s)) => s.clone(),
            Some(RawValue::List(_)) => {
                return Err(Error::Config(format!(
                    "{} must be a single value",
                    KEY_LOOKBACK_PERIOD
                )))
            }
            None => DEFAULT_LOOKBACK.to_string(),
        };
        if !VALID_LOOKBACKS.contains(&lookback_period.as_str()) {
            return Err(Error::Config(format!(
                "invalid {} '{}' (valid: {})",
                KEY_LOOKBACK_PERIOD,
                lookback_period,
                VALID_LOOKBACKS.join(", ")
            )));
        }

        let tickers = resolve_tickers(&raw, path)?;
        if tickers.is_empty() {
            return Err(Error::Config(
                "ticker list is empty; set TICKERS or TICKER_FILE".to_string(),
            ));
        }

        Ok(Config {
            output_file,
            lookback_period,
            tickers,
        })
    }
}

/// Resolve the ticker list from either the inline TICKERS value or a
/// line-delimited TICKER_FILE (relative to the config file's directory).
fn resolve_tickers(raw: &HashMap<String, RawValue>, config_path: &Path) -> Result<Vec<String>> {
    match (raw.get(KEY_TICKERS), raw.get(KEY_TICKER_FILE)) {
        (Some(_), Some(_)) => Err(Error::Config(format!(
            "{} and {} are mutually exclusive; set only one",
            KEY_TICKERS, KEY_TICKER_FILE
        ))),
        (Some(RawValue::List(list)), None) => Ok(list.clone()),
        (Some(RawValue::Scalar(s)), None) => Ok(vec![s.clone()]),
        (None, Some(RawValue::Scalar(file))) => {
            let ticker_path = match config_path.parent() {
                Some(dir) => dir.join(file),
                None => PathBuf::from(file),
            };
            tickers::read_ticker_file(&ticker_path)
        }
        (None, Some(RawValue::List(_))) => Err(Error::Config(format!(
            "{} must be a single file name",
            KEY_TICKER_FILE
        ))),
        (None, None) => Err(Error::Config(format!(
            "missing ticker source; set {} or {}",
            KEY_TICKERS, KEY_TICKER_FILE
        ))),
    }
}

/// Parse INI-shaped contents into a flat key/value map.
fn parse_ini(contents: &str) -> Result<HashMap<String, RawValue>> {
    let mut values = HashMap::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        // Section headers only group keys; nothing to record.
        if line.starts_with('[') && line.ends_with(']') {
            continue;
        }

        let delim = line
            .find(['=', ':'])
            .ok_or_else(|| {
                Error::Config(format!(
                    "line {}: expected 'key=value' or 'key:value', got '{}'",
                    line_num + 1,
                    line
                ))
            })?;

        let key = line[..delim].trim().to_string();
        let value = line[delim + 1..].trim();

        if key.is_empty() {
            return Err(Error::Config(format!("line {}: empty key", line_num + 1)));
        }

        let parsed = if value.contains(',') {
            RawValue::List(
                value
                    .split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
            )
        } else {
            RawValue::Scalar(value.to_string())
        };

        values.insert(key, parsed);
    }

    Ok(values)
}
