use crate::domain::rate_limit::RatePolicy;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP order service
    Serve(ServeArgs),
    /// Load a catalog CSV into the persistent ledger
    Import(ImportArgs),
    /// Print current products and stock as CSV
    Stock(StorageArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "ORDERDESK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Catalog CSV (id,name,price,stock) loaded into the ledger at startup
    #[arg(long, env = "ORDERDESK_CATALOG")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Address to listen on
    #[arg(long, env = "ORDERDESK_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Accepted requests per caller address and window
    #[arg(
        long,
        env = "ORDERDESK_RATE_LIMIT",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rate_limit: u32,

    /// Length of the rate-limit window in seconds
    #[arg(
        long,
        env = "ORDERDESK_RATE_WINDOW_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_window_secs: u64,

    /// How often expired rate-limit entries are swept; defaults to twice the window
    #[arg(
        long,
        env = "ORDERDESK_CACHE_SWEEP_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_sweep_secs: Option<u64>,

    /// How long the product listing stays cached, in seconds
    #[arg(
        long,
        env = "ORDERDESK_CATALOG_CACHE_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub catalog_cache_secs: u64,
}

impl ServeArgs {
    pub fn catalog_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_cache_secs)
    }

    pub fn rate_policy(&self) -> RatePolicy {
        RatePolicy::new(self.rate_limit, Duration::from_secs(self.rate_window_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.cache_sweep_secs
                .unwrap_or(self.rate_window_secs.saturating_mul(2)),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Catalog CSV file to import
    pub input: PathBuf,

    /// Path to the persistent database
    #[arg(long, env = "ORDERDESK_DB_PATH")]
    pub db_path: PathBuf,
}
