mod price_record;

pub use price_record::{FetchedRecord, PriceRecord};

/// Full persisted collection of per-ticker, per-date price rows, in append
/// order. Invariant: at most one record per (ticker, date) pair.
pub type PriceTable = Vec<PriceRecord>;
