use crate::domain::product::ProductId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Product {0} not found")]
    NotFound(ProductId),
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },
    #[error("Persistence error: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Wraps a storage-layer failure.
    pub fn persistence(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(err)
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for AppError {
    fn from(err: rocksdb::Error) -> Self {
        Self::persistence(err)
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
