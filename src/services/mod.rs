pub mod merge;
pub mod provider;
pub mod table_store;
pub mod tickers;
pub mod yahoo;

pub use provider::{
    ConsoleProgress, FetchOutcome, MarketDataClient, ProgressObserver, RunSummary, TickerOutcome,
};
pub use yahoo::YahooClient;
