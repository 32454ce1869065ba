use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::{Money, Product};

/// A line of an order. Its identity is the (order, product) pair, so an
/// order never holds two lines for the same product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,

    /// Product name, read alongside the line for display.
    pub product_name: String,

    pub quantity: i32,

    /// Price per unit captured when the line was created.
    pub unit_price: Money,

    /// Stored with the line but not taken into account by `subtotal`.
    pub discount: Money,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: i32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            discount: Money::zero(),
        }
    }

    /// Creates a line for a product at its current price with no discount.
    pub fn for_product(product: &Product, quantity: i32) -> Self {
        Self::new(product.id, product.name.clone(), quantity, product.price)
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Quantity × unit price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}
