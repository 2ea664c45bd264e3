use crate::domain::product::{Money, Product, ProductId};
use crate::error::{AppError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One raw catalog row, before validation.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: String,
    name: String,
    // Kept as text so csv never infers a float.
    price: String,
    stock: i64,
}

impl TryFrom<CatalogRecord> for Product {
    type Error = AppError;

    fn try_from(record: CatalogRecord) -> Result<Self> {
        let id: ProductId = record.id.parse()?;
        let price = Decimal::from_str_exact(&record.price).map_err(|_| {
            AppError::Validation(format!(
                "price '{}' for '{}' is not a decimal",
                record.price, record.name
            ))
        })?;
        let price = Money::price(price)?;
        let stock = u32::try_from(record.stock).map_err(|_| {
            AppError::Validation(format!(
                "stock for '{}' must be a non-negative integer",
                record.name
            ))
        })?;
        Ok(Product::new(id, record.name, price, stock))
    }
}

/// Reads catalog products from a CSV source with an `id,name,price,stock` header.
///
/// Wraps `csv::Reader`, trimming whitespace and accepting flexible record lengths.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    /// Creates a new `CatalogReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and validates products, one result per record.
    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader.into_deserialize().map(|result| {
            let record: CatalogRecord = result.map_err(AppError::from)?;
            Product::try_from(record)
        })
    }
}
