use crate::domain::ports::SharedLedger;
use crate::domain::product::{Product, ProductId};
use crate::error::{AppError, Result};
use crate::infrastructure::expiring::ExpiringStore;
use tracing::debug;

const LISTING_KEY: &str = "products:all";

/// Read side of the catalog, with the full listing cached in an [`ExpiringStore`].
///
/// The cached listing lives for the store's default TTL or until [`ProductCatalog::invalidate`]
/// is called after a stock change.
pub struct ProductCatalog {
    ledger: SharedLedger,
    listings: ExpiringStore<String, Vec<Product>>,
}

impl ProductCatalog {
    pub fn new(ledger: SharedLedger, listings: ExpiringStore<String, Vec<Product>>) -> Self {
        Self { ledger, listings }
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        let key = LISTING_KEY.to_string();
        if let Some(products) = self.listings.get(&key) {
            debug!(count = products.len(), "product listing served from cache");
            return Ok(products);
        }
        let products = self.ledger.products().await?;
        self.listings.set(key, products.clone());
        Ok(products)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.ledger
            .product(id)
            .await?
            .ok_or(AppError::NotFound(id))
    }

    /// Drops the cached listing so the next read sees current stock.
    pub fn invalidate(&self) {
        self.listings.remove(&LISTING_KEY.to_string());
    }
}
