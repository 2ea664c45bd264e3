use crate::domain::order::{CallerId, Order};
use crate::domain::ports::{StockLedger, UnitOfWork, UnitOfWorkBox};
use crate::domain::product::{Product, ProductId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Column Family for product rows.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for committed orders, items included.
pub const CF_ORDERS: &str = "orders";

/// How long a unit of work waits for a row lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT_MS: i64 = 5_000;

/// A persistent stock ledger on top of a RocksDB `TransactionDB`.
///
/// Products and orders live in separate Column Families, keyed by the raw 16 bytes of
/// their UUID and stored as JSON. Exclusive row locks are taken with `get_for_update`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<TransactionDB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<TransactionDB>,
}

impl RocksDbLedger {
    /// Opens or creates a ledger at `path` with the default lock timeout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT_MS)
    }

    /// Opens or creates a ledger at `path`.
    ///
    /// Ensures that the required column families ("products" and "orders") exist.
    pub fn open_with_lock_timeout<P: AsRef<Path>>(path: P, lock_timeout_ms: i64) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(lock_timeout_ms);

        let cf_products = ColumnFamilyDescriptor::new(CF_PRODUCTS, Options::default());
        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());

        let db = TransactionDB::open_cf_descriptors(
            &opts,
            &txn_opts,
            path,
            vec![cf_products, cf_orders],
        )?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| AppError::persistence(format!("column family '{name}' not found")))
    }
}

#[async_trait]
impl StockLedger for RocksDbLedger {
    async fn begin<'a>(&'a self) -> Result<UnitOfWorkBox<'a>> {
        Ok(Box::new(RocksDbUnitOfWork {
            ledger: self,
            txn: self.db.transaction(),
            locked: HashSet::new(),
        }))
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        let cf = self.cf(CF_PRODUCTS)?;
        let value = serde_json::to_vec(&product)?;
        self.db.put_cf(cf, product.id.0.as_bytes(), value)?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let cf = self.cf(CF_PRODUCTS)?;
        match self.db.get_cf(cf, id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn products(&self) -> Result<Vec<Product>> {
        let cf = self.cf(CF_PRODUCTS)?;
        let mut products = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            products.push(serde_json::from_slice::<Product>(&value)?);
        }
        Ok(products)
    }

    async fn orders_for(&self, owner: CallerId) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let order: Order = serde_json::from_slice(&value)?;
            if order.owner == owner {
                orders.push(order);
            }
        }
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

/// Runs a call that may wait on a row lock or on disk.
///
/// On a multi-threaded runtime the worker hands its other tasks off first, so a contended
/// row cannot stall unrelated requests for up to the lock timeout.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Unit of work backed by a RocksDB pessimistic transaction.
///
/// Dropping the transaction without committing rolls it back and releases its locks.
pub struct RocksDbUnitOfWork<'a> {
    ledger: &'a RocksDbLedger,
    txn: Transaction<'a, TransactionDB>,
    locked: HashSet<ProductId>,
}

#[async_trait]
impl<'a> UnitOfWork for RocksDbUnitOfWork<'a> {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let cf = self.ledger.cf(CF_PRODUCTS)?;
        let txn = &self.txn;
        let bytes = blocking(|| txn.get_for_update_cf(cf, id.0.as_bytes(), true))?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        tracing::debug!(product = %id, "row lock acquired");
        self.locked.insert(id);
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        if !self.locked.contains(&product.id) {
            return Err(AppError::persistence(format!(
                "product {} saved without holding its row lock",
                product.id
            )));
        }
        let cf = self.ledger.cf(CF_PRODUCTS)?;
        let value = serde_json::to_vec(product)?;
        self.txn.put_cf(cf, product.id.0.as_bytes(), value)?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        let cf = self.ledger.cf(CF_ORDERS)?;
        let value = serde_json::to_vec(order)?;
        self.txn.put_cf(cf, order.id.0.as_bytes(), value)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let txn = self.txn;
        blocking(move || txn.commit())?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.txn.rollback()?;
        Ok(())
    }
}
