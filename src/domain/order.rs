use super::product::{Money, Product, ProductId, Quantity};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of the authenticated caller placing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(pub Uuid);

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CallerId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AppError::Unauthorized(format!("invalid caller id '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
}

/// One validated line of a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    /// Validates raw request input into a line.
    pub fn parse(product_id: &str, quantity: i64) -> Result<Self, AppError> {
        Ok(Self {
            product_id: product_id.parse()?,
            quantity: Quantity::try_from(quantity)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Price of the product while its row was locked by this order.
    pub unit_price: Money,
}

/// A purchase and its items.
///
/// Built entirely inside one unit of work; the total is always derived from the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: CallerId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn pending(owner: CallerId) -> Self {
        Self {
            id: OrderId(Uuid::new_v4()),
            owner,
            status: OrderStatus::Pending,
            total_price: Money::ZERO,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds an item priced from `product` as currently held and updates the total.
    ///
    /// Leaves the order untouched when the line or the new total would overflow.
    pub fn add_item(&mut self, product: &Product, quantity: Quantity) -> Result<(), AppError> {
        let total = self
            .total_price
            .checked_add(product.price.times(quantity)?)?;
        self.items.push(OrderItem {
            id: Uuid::new_v4(),
            order_id: self.id,
            product_id: product.id,
            quantity,
            unit_price: product.price,
        });
        self.total_price = total;
        Ok(())
    }
}
