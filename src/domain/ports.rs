use super::order::{CallerId, Order};
use super::product::{Product, ProductId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistent store of products and committed orders.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Opens a unit of work with row-level exclusive locking.
    async fn begin<'a>(&'a self) -> Result<UnitOfWorkBox<'a>>;
    /// Inserts or replaces a catalog row outside of any unit of work.
    async fn put_product(&self, product: Product) -> Result<()>;
    async fn product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn products(&self) -> Result<Vec<Product>>;
    async fn orders_for(&self, owner: CallerId) -> Result<Vec<Order>>;
}

/// A transaction against a [`StockLedger`].
///
/// Locks taken by [`UnitOfWork::lock_product`] are held until `commit` or `rollback`.
/// Dropping an uncommitted unit of work discards every staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Exclusively locks a product row and reads it, waiting for any other holder.
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>>;
    /// Stages a new version of a row previously locked by this unit of work.
    async fn save_product(&mut self, product: &Product) -> Result<()>;
    async fn insert_order(&mut self, order: &Order) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub type UnitOfWorkBox<'a> = Box<dyn UnitOfWork + 'a>;
pub type SharedLedger = Arc<dyn StockLedger>;
