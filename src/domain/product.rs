use crate::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProductId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid product id '{s}'")))
    }
}

/// An exact monetary value.
///
/// Wraps `rust_decimal::Decimal` so prices and totals never go through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// A unit price must be strictly positive.
    pub fn price(amount: Decimal) -> Result<Self, AppError> {
        if amount > Decimal::ZERO {
            Ok(Self(amount))
        } else {
            Err(AppError::Validation("price must be positive".to_string()))
        }
    }

    /// Price of `quantity` units; amounts beyond `Decimal`'s range are rejected.
    pub fn times(self, quantity: Quantity) -> Result<Self, AppError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .map(Self)
            .ok_or_else(|| AppError::Validation(format!("{self} x {quantity} is out of range")))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, AppError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| AppError::Validation(format!("{self} + {rhs} is out of range")))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A strictly positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, AppError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(AppError::Validation(
                "quantity must be a positive integer".to_string(),
            ))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| {
            AppError::Validation(format!("quantity {value} is out of range"))
        })?;
        Self::new(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

/// The stock-relevant view of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
        }
    }

    /// Removes `quantity` units from stock, refusing to go below zero.
    pub fn take_stock(&mut self, quantity: Quantity) -> Result<(), AppError> {
        match self.stock.checked_sub(quantity.get()) {
            Some(remaining) => {
                self.stock = remaining;
                Ok(())
            }
            None => Err(AppError::InsufficientStock {
                product: self.name.clone(),
                requested: quantity.get(),
                available: self.stock,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_times_quantity() {
        let price = Money::new(dec!(7.50));
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.times(qty).unwrap(), Money::new(dec!(22.50)));
    }

    #[test]
    fn test_money_overflow_is_rejected() {
        let huge = Money::new(Decimal::MAX);
        assert!(matches!(
            huge.times(Quantity::new(2).unwrap()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            huge.checked_add(Money::new(dec!(1))),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            Money::new(dec!(1.25)).checked_add(Money::new(dec!(2.50))).unwrap(),
            Money::new(dec!(3.75))
        );
    }

    #[test]
    fn test_price_validation() {
        assert!(Money::price(dec!(0.01)).is_ok());
        assert!(matches!(
            Money::price(dec!(0.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Money::price(dec!(-3.0)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_quantity_validation() {
        assert!(Quantity::new(1).is_ok());
        assert!(matches!(Quantity::new(0), Err(AppError::Validation(_))));
        assert!(matches!(
            Quantity::try_from(-2_i64),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Quantity::try_from(i64::from(u32::MAX) + 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_product_id_parse() {
        let id = ProductId::new();
        assert_eq!(id.to_string().parse::<ProductId>().unwrap(), id);
        assert!(matches!(
            "not-a-uuid".parse::<ProductId>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_take_stock_success() {
        let mut product = Product::new(ProductId::new(), "Lamp", Money::new(dec!(10.0)), 5);
        product.take_stock(Quantity::new(5).unwrap()).unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_take_stock_insufficient() {
        let mut product = Product::new(ProductId::new(), "Lamp", Money::new(dec!(10.0)), 2);
        let result = product.take_stock(Quantity::new(3).unwrap());
        match result {
            Err(AppError::InsufficientStock {
                product: name,
                requested,
                available,
            }) => {
                assert_eq!(name, "Lamp");
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(product.stock, 2);
    }
}
