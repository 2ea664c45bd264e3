use crate::domain::order::{CallerId, Order, OrderLine};
use crate::domain::ports::{SharedLedger, UnitOfWorkBox};
use crate::domain::product::{Product, ProductId};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Places orders against the shared stock ledger.
///
/// Each call runs as one unit of work: either every stock decrement, the order and all of
/// its items commit together, or nothing does. Product rows are locked in ascending id
/// order, so two orders over the same products can never wait on each other in a cycle.
pub struct OrderPlacementCoordinator {
    ledger: SharedLedger,
}

impl OrderPlacementCoordinator {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    /// Commits a purchase of `lines` on behalf of `caller`.
    ///
    /// Lines are checked in the order given; the first line that cannot be filled decides
    /// the error and aborts the whole order.
    #[instrument(skip(self, lines), fields(caller = %caller, lines = lines.len()))]
    pub async fn place_order(&self, caller: CallerId, lines: Vec<OrderLine>) -> Result<Order> {
        if lines.is_empty() {
            return Err(AppError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }

        let mut uow = self.ledger.begin().await?;
        let mut order = Order::pending(caller);

        match fill(&mut uow, &mut order, &lines).await {
            Ok(()) => {
                uow.commit().await?;
                info!(order = %order.id, total = %order.total_price, "order committed");
                Ok(order)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                warn!(error = %err, "order rolled back");
                Err(err)
            }
        }
    }

    pub async fn orders_for(&self, caller: CallerId) -> Result<Vec<Order>> {
        self.ledger.orders_for(caller).await
    }
}

async fn fill(uow: &mut UnitOfWorkBox<'_>, order: &mut Order, lines: &[OrderLine]) -> Result<()> {
    // A missing product is recorded rather than failed on, so the error surfaces at its
    // line below, after any earlier line's error.
    let mut rows: BTreeMap<ProductId, Option<Product>> = BTreeMap::new();
    for line in lines {
        rows.entry(line.product_id).or_insert(None);
    }
    for (id, row) in rows.iter_mut() {
        *row = uow.lock_product(*id).await?;
    }

    for line in lines {
        let product = rows
            .get_mut(&line.product_id)
            .and_then(Option::as_mut)
            .ok_or(AppError::NotFound(line.product_id))?;
        product.take_stock(line.quantity)?;
        order.add_item(product, line.quantity)?;
    }

    for product in rows.values().flatten() {
        uow.save_product(product).await?;
    }
    uow.insert_order(order).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::domain::product::{Money, Quantity};
    use crate::infrastructure::in_memory::InMemoryLedger;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn seeded(products: &[Product]) -> (OrderPlacementCoordinator, SharedLedger) {
        let ledger: SharedLedger = Arc::new(InMemoryLedger::new());
        for product in products {
            ledger.put_product(product.clone()).await.unwrap();
        }
        (OrderPlacementCoordinator::new(ledger.clone()), ledger)
    }

    fn line(product: &Product, quantity: u32) -> OrderLine {
        OrderLine::new(product.id, Quantity::new(quantity).unwrap())
    }

    #[tokio::test]
    async fn test_empty_order_is_rejected() {
        let (coordinator, _) = seeded(&[]).await;
        let result = coordinator
            .place_order(CallerId(Uuid::new_v4()), Vec::new())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_single_item_order() {
        let product = Product::new(ProductId::new(), "Test Product", Money::new(dec!(100.00)), 5);
        let (coordinator, ledger) = seeded(&[product.clone()]).await;
        let caller = CallerId(Uuid::new_v4());

        let order = coordinator
            .place_order(caller, vec![line(&product, 2)])
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.owner, caller);
        assert_eq!(order.total_price, Money::new(dec!(200.00)));
        assert_eq!(ledger.product(product.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(coordinator.orders_for(caller).await.unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let product = Product::new(ProductId::new(), "Known", Money::new(dec!(1.00)), 5);
        let (coordinator, ledger) = seeded(&[product.clone()]).await;
        let missing = ProductId::new();

        let result = coordinator
            .place_order(
                CallerId(Uuid::new_v4()),
                vec![
                    line(&product, 1),
                    OrderLine::new(missing, Quantity::new(1).unwrap()),
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(id)) if id == missing));
        assert_eq!(ledger.product(product.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_first_failing_line_decides_error() {
        let scarce = Product::new(ProductId::new(), "Scarce", Money::new(dec!(1.00)), 1);
        let (coordinator, _) = seeded(&[scarce.clone()]).await;

        // The missing product may sort before or after `scarce`; the error must still
        // come from the first line in request order.
        let result = coordinator
            .place_order(
                CallerId(Uuid::new_v4()),
                vec![
                    line(&scarce, 2),
                    OrderLine::new(ProductId::new(), Quantity::new(1).unwrap()),
                ],
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::InsufficientStock { ref product, .. }) if product == "Scarce"
        ));
    }
}
