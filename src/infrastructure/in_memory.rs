use crate::domain::order::{CallerId, Order, OrderId};
use crate::domain::ports::{StockLedger, UnitOfWork, UnitOfWorkBox};
use crate::domain::product::{Product, ProductId};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

type ProductRow = Arc<Mutex<Product>>;

/// A thread-safe in-memory stock ledger.
///
/// Every product row sits behind its own `tokio::sync::Mutex`, which plays the role of an
/// exclusive row lock: a unit of work holds the owned guard until it commits or rolls back.
/// The outer `RwLock` only guards the row index and is never held across a row lock.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    products: Arc<RwLock<HashMap<ProductId, ProductRow>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    async fn row(&self, id: ProductId) -> Option<ProductRow> {
        self.products.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl StockLedger for InMemoryLedger {
    async fn begin<'a>(&'a self) -> Result<UnitOfWorkBox<'a>> {
        Ok(Box::new(InMemoryUnitOfWork {
            ledger: self.clone(),
            locked: HashMap::new(),
            staged: HashMap::new(),
            orders: Vec::new(),
        }))
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        let existing = products.get(&product.id).cloned();
        match existing {
            Some(row) => {
                // Never wait on a row lock while holding the index.
                drop(products);
                *row.lock().await = product;
            }
            None => {
                products.insert(product.id, Arc::new(Mutex::new(product)));
            }
        }
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        match self.row(id).await {
            Some(row) => Ok(Some(row.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn products(&self) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = self.products.read().await.values().cloned().collect();
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(row.lock().await.clone());
        }
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn orders_for(&self, owner: CallerId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut owned: Vec<Order> = orders
            .values()
            .filter(|order| order.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|order| order.created_at);
        Ok(owned)
    }
}

/// Unit of work over [`InMemoryLedger`].
///
/// Writes are staged locally and only become visible on commit, while the row guards are
/// still held. Dropping it releases the guards and discards the staged writes.
pub struct InMemoryUnitOfWork {
    ledger: InMemoryLedger,
    locked: HashMap<ProductId, OwnedMutexGuard<Product>>,
    staged: HashMap<ProductId, Product>,
    orders: Vec<Order>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        if let Some(product) = self.staged.get(&id) {
            return Ok(Some(product.clone()));
        }
        if let Some(guard) = self.locked.get(&id) {
            return Ok(Some((**guard).clone()));
        }
        let Some(row) = self.ledger.row(id).await else {
            return Ok(None);
        };
        let guard = row.lock_owned().await;
        tracing::debug!(product = %id, "row lock acquired");
        let product = (*guard).clone();
        self.locked.insert(id, guard);
        Ok(Some(product))
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        if !self.locked.contains_key(&product.id) {
            return Err(AppError::persistence(format!(
                "product {} saved without holding its row lock",
                product.id
            )));
        }
        self.staged.insert(product.id, product.clone());
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.orders.push(order.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork {
            ledger,
            mut locked,
            staged,
            orders,
        } = *self;

        {
            let mut committed = ledger.orders.write().await;
            for order in orders {
                committed.insert(order.id, order);
            }
        }
        for (id, product) in staged {
            if let Some(guard) = locked.get_mut(&id) {
                **guard = product;
            }
        }
        // Row locks are released here, after every write is in place.
        drop(locked);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
