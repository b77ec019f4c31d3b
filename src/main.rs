mod cli;
mod commands;
mod config;
mod error;
mod models;
mod services;
mod utils;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    cli::run();
}
