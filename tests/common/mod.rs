#![allow(dead_code)]

use orderdesk::application::orders::OrderPlacementCoordinator;
use orderdesk::domain::order::{CallerId, OrderLine};
use orderdesk::domain::ports::SharedLedger;
use orderdesk::domain::product::{Money, Product, ProductId, Quantity};
use orderdesk::infrastructure::in_memory::InMemoryLedger;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

pub fn product(name: &str, price: Decimal, stock: u32) -> Product {
    Product::new(ProductId::new(), name, Money::new(price), stock)
}

pub fn line(product: &Product, quantity: u32) -> OrderLine {
    OrderLine::new(product.id, Quantity::new(quantity).unwrap())
}

pub fn caller() -> CallerId {
    CallerId(Uuid::new_v4())
}

pub async fn seeded(products: &[Product]) -> (Arc<OrderPlacementCoordinator>, SharedLedger) {
    let ledger: SharedLedger = Arc::new(InMemoryLedger::new());
    let coordinator = seed(ledger.clone(), products).await;
    (coordinator, ledger)
}

pub async fn seed(ledger: SharedLedger, products: &[Product]) -> Arc<OrderPlacementCoordinator> {
    for product in products {
        ledger.put_product(product.clone()).await.unwrap();
    }
    Arc::new(OrderPlacementCoordinator::new(ledger))
}

pub async fn stock_of(ledger: &SharedLedger, product: &Product) -> u32 {
    ledger.product(product.id).await.unwrap().unwrap().stock
}

pub fn catalog_file(rows: &[&str]) -> NamedTempFile {
    let mut csv = NamedTempFile::new().unwrap();
    writeln!(csv, "id, name, price, stock").unwrap();
    for row in rows {
        writeln!(csv, "{row}").unwrap();
    }
    csv
}
