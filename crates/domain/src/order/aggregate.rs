//! Order aggregate implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, OrderId, ProductId};

use super::{OrderItem, Payment, PaymentState};
use crate::{Money, OrderError, Product};

/// Order aggregate root.
///
/// The order owns its items and its payment: both are created, changed and
/// removed only through the methods below, and are persisted together with
/// the order. Items are keyed by product, so there is at most one line per
/// product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Assigned by the store when the order is first persisted.
    id: Option<OrderId>,

    placed_at: DateTime<Utc>,

    customer_id: CustomerId,

    delivery_address_id: AddressId,

    payment: Option<Payment>,

    items: BTreeMap<ProductId, OrderItem>,
}

impl Order {
    /// Starts a new, not yet persisted order with no items and no payment.
    pub fn new(
        customer_id: CustomerId,
        delivery_address_id: AddressId,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            placed_at,
            customer_id,
            delivery_address_id,
            payment: None,
            items: BTreeMap::new(),
        }
    }

    /// Rebuilds a persisted order from stored rows.
    pub fn restore(
        id: OrderId,
        placed_at: DateTime<Utc>,
        customer_id: CustomerId,
        delivery_address_id: AddressId,
        payment: Option<Payment>,
        items: impl IntoIterator<Item = OrderItem>,
    ) -> Self {
        Self {
            id: Some(id),
            placed_at,
            customer_id,
            delivery_address_id,
            payment,
            items: items
                .into_iter()
                .map(|item| (item.product_id, item))
                .collect(),
        }
    }

    /// Records the identifier given by the store. The payment shares it.
    pub fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn delivery_address_id(&self) -> AddressId {
        self.delivery_address_id
    }

    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    /// Returns all items, ordered by product id.
    pub fn items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.values()
    }

    pub fn get_item(&self, product_id: ProductId) -> Option<&OrderItem> {
        self.items.get(&product_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity over all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.values().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Sum of every line's quantity × unit price, computed on each call.
    ///
    /// Line discounts are not subtracted.
    pub fn total(&self) -> Money {
        self.items.values().map(OrderItem::subtotal).sum()
    }
}

// Mutations
impl Order {
    /// Points the order at another customer and delivery address.
    pub fn reassign(&mut self, customer_id: CustomerId, delivery_address_id: AddressId) {
        self.customer_id = customer_id;
        self.delivery_address_id = delivery_address_id;
    }

    /// Attaches the order's payment, replacing any previous one.
    pub fn attach_payment(&mut self, payment: Payment) {
        self.payment = Some(payment);
    }

    /// Overwrites the payment state. Any state may follow any other.
    pub fn set_payment_state(&mut self, state: PaymentState) -> Result<(), OrderError> {
        let payment = self.payment.as_mut().ok_or(OrderError::MissingPayment)?;
        payment.set_state(state);
        Ok(())
    }

    /// Adds `quantity` units of a product.
    ///
    /// If the order already has a line for the product its quantity grows;
    /// otherwise a new line is created at the product's current price.
    /// Fails with `QuantityOverflow`, leaving the line as it was, when the
    /// merged quantity does not fit.
    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<(), OrderError> {
        validate_quantity(quantity)?;

        match self.items.get_mut(&product.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(quantity).ok_or(
                    OrderError::QuantityOverflow {
                        product_id: product.id.as_i64(),
                    },
                )?;
            }
            None => {
                self.items
                    .insert(product.id, OrderItem::for_product(product, quantity));
            }
        }
        Ok(())
    }

    /// Makes the order's lines exactly the given products with the given
    /// quantities.
    ///
    /// Lines for products not listed are removed; listed products keep their
    /// line (and captured price) with the new quantity, or get a new line.
    /// Every quantity is checked before anything changes, so on error the
    /// order is left as it was. When a product is listed twice the last
    /// quantity wins.
    pub fn reconcile_items<'a>(
        &mut self,
        desired: impl IntoIterator<Item = (&'a Product, i32)>,
    ) -> Result<(), OrderError> {
        let desired: BTreeMap<ProductId, (&Product, i32)> = desired
            .into_iter()
            .map(|(product, quantity)| (product.id, (product, quantity)))
            .collect();

        for (_, quantity) in desired.values() {
            validate_quantity(*quantity)?;
        }

        self.items
            .retain(|product_id, _| desired.contains_key(product_id));

        for (product, quantity) in desired.into_values() {
            match self.items.get_mut(&product.id) {
                Some(existing) => existing.quantity = quantity,
                None => self.add_item(product, quantity)?,
            }
        }
        Ok(())
    }

    /// Detaches a line. The store deletes it when the order is saved.
    pub fn remove_item(&mut self, product_id: ProductId) -> Option<OrderItem> {
        self.items.remove(&product_id)
    }
}

fn validate_quantity(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::InvalidQuantity { quantity });
    }
    Ok(())
}
