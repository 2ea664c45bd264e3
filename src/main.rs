use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderdesk::application::catalog::ProductCatalog;
use orderdesk::application::governor::RateGovernor;
use orderdesk::application::orders::OrderPlacementCoordinator;
use orderdesk::config::{Cli, Command, ImportArgs, ServeArgs, StorageArgs};
use orderdesk::domain::ports::SharedLedger;
use orderdesk::infrastructure::expiring::ExpiringStore;
use orderdesk::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use orderdesk::infrastructure::rocksdb::RocksDbLedger;
use orderdesk::interfaces::csv::catalog_reader::CatalogReader;
use orderdesk::interfaces::csv::product_writer::ProductWriter;
use orderdesk::interfaces::http::{self, AppState};
use orderdesk::logging;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Import(args) => import(args).await,
        Command::Stock(args) => stock(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let ledger = open_ledger(args.storage.db_path.as_deref())?;
    if let Some(catalog) = &args.storage.catalog {
        load_catalog(&ledger, catalog).await?;
    }

    let policy = args.rate_policy();
    let counters = ExpiringStore::new(policy.entry_ttl());
    let sweeper = counters.spawn_sweeper(args.sweep_interval());
    let governor = RateGovernor::new(counters, policy);

    let listings = ExpiringStore::new(args.catalog_cache_ttl());
    let listing_sweeper = listings.spawn_sweeper(listings.default_ttl() * 2);
    let catalog = ProductCatalog::new(ledger.clone(), listings);

    let state = AppState::new(OrderPlacementCoordinator::new(ledger), catalog);
    let app = http::router(state, governor);

    let listener = TcpListener::bind(args.bind).await.into_diagnostic()?;
    let local_addr = listener.local_addr().into_diagnostic()?;
    info!(
        bind = %local_addr,
        rate_limit = policy.limit,
        window_secs = policy.window.as_secs(),
        "listening"
    );

    http::serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
        }
    })
    .await
    .into_diagnostic()?;

    sweeper.abort();
    listing_sweeper.abort();
    info!("shut down");
    Ok(())
}

async fn import(args: ImportArgs) -> Result<()> {
    let ledger = open_ledger(Some(&args.db_path))?;
    let loaded = load_catalog(&ledger, &args.input).await?;
    info!(loaded, "catalog imported");
    Ok(())
}

async fn stock(args: StorageArgs) -> Result<()> {
    let ledger = open_ledger(args.db_path.as_deref())?;
    if let Some(catalog) = &args.catalog {
        load_catalog(&ledger, catalog).await?;
    }

    let products = ledger.products().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = ProductWriter::new(stdout.lock());
    writer.write_products(products).into_diagnostic()?;
    Ok(())
}

fn open_ledger(db_path: Option<&Path>) -> Result<SharedLedger> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let ledger = RocksDbLedger::open(path).into_diagnostic()?;
            info!(path = %path.display(), "using RocksDB storage");
            Ok(Arc::new(ledger))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryLedger::new()))
        }
        None => Ok(Arc::new(InMemoryLedger::new())),
    }
}

/// Loads every valid row of a catalog CSV, reporting and skipping bad ones.
async fn load_catalog(ledger: &SharedLedger, path: &Path) -> Result<usize> {
    let file = File::open(path).into_diagnostic()?;
    let reader = CatalogReader::new(file);
    let mut loaded = 0;
    for product in reader.products() {
        match product {
            Ok(product) => {
                ledger.put_product(product).await.into_diagnostic()?;
                loaded += 1;
            }
            Err(e) => {
                warn!("Error reading product: {e}");
            }
        }
    }
    Ok(loaded)
}
