use std::collections::HashMap;

use chrono::Utc;
use common::{AddressId, CustomerId, OrderId, Page, PageRequest, ProductId};
use domain::{Order, Payment, PaymentKind, PaymentState, Product};
use store::{CustomerRepository, OrderRepository, ProductRepository, Store, UnitOfWork};

use super::{Result, ServiceError};

/// One requested order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Input for placing a new order. The payment kind arrives as its wire code.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub delivery_address_id: AddressId,
    pub payment_kind: i32,
    pub installments: Option<i32>,
    pub items: Vec<ItemLine>,
}

/// Input for revising an existing order. `items` is the full desired set of
/// lines; the payment state arrives as its wire code.
#[derive(Debug, Clone)]
pub struct OrderChanges {
    pub customer_id: CustomerId,
    pub delivery_address_id: AddressId,
    pub payment_state: i32,
    pub items: Vec<ItemLine>,
}

/// Service for placing and managing orders.
///
/// Orders are loaded and saved as whole aggregates (header, payment and
/// items) inside a single unit of work.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order with a pending payment.
    ///
    /// Lines naming the same product are merged into one.
    #[tracing::instrument(skip(self))]
    pub async fn insert(&self, cmd: PlaceOrder) -> Result<Order> {
        let kind = PaymentKind::from_code(cmd.payment_kind)?;

        let mut uow = self.store.begin().await?;
        check_references(&mut uow, cmd.customer_id, cmd.delivery_address_id).await?;
        let products = load_products(&mut uow, &cmd.items).await?;

        let mut order = Order::new(cmd.customer_id, cmd.delivery_address_id, Utc::now());
        order.attach_payment(Payment::pending(kind, cmd.installments));
        for line in &cmd.items {
            order.add_item(product(&products, line.product_id)?, line.quantity)?;
        }

        let id = uow.insert_order(&order).await?;
        order.assign_id(id);
        uow.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %id, items = order.item_count(), "order placed");
        Ok(order)
    }

    /// Lists orders sorted by placement time.
    #[tracing::instrument(skip(self))]
    pub async fn find_page(&self, page: PageRequest) -> Result<Page<Order>> {
        let mut uow = self.store.begin().await?;
        let orders = uow.list_orders(page).await?;
        uow.commit().await?;
        Ok(orders)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: OrderId) -> Result<Order> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .find_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;
        uow.commit().await?;
        Ok(order)
    }

    /// Re-points the order, overwrites its payment state and makes its lines
    /// exactly the requested ones.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: OrderId, changes: OrderChanges) -> Result<Order> {
        let state = PaymentState::from_code(changes.payment_state)?;

        let mut uow = self.store.begin().await?;
        let mut order = uow
            .find_order_for_update(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", id))?;
        check_references(&mut uow, changes.customer_id, changes.delivery_address_id).await?;
        let products = load_products(&mut uow, &changes.items).await?;

        order.reassign(changes.customer_id, changes.delivery_address_id);
        order.set_payment_state(state)?;
        let desired = changes
            .items
            .iter()
            .map(|line| -> Result<(&Product, i32)> {
                Ok((product(&products, line.product_id)?, line.quantity))
            })
            .collect::<Result<Vec<_>>>()?;
        order.reconcile_items(desired)?;

        uow.update_order(&order).await?;
        uow.commit().await?;

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(order_id = %id, items = order.item_count(), "order updated");
        Ok(order)
    }

    /// Deletes the order along with its payment and items.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        uow.delete_order(id).await?;
        uow.commit().await?;

        metrics::counter!("orders_deleted_total").increment(1);
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

async fn check_references<U: CustomerRepository>(
    uow: &mut U,
    customer_id: CustomerId,
    address_id: AddressId,
) -> Result<()> {
    if uow.find_customer(customer_id).await?.is_none() {
        return Err(ServiceError::not_found("Customer", customer_id));
    }
    if uow.find_address(address_id).await?.is_none() {
        return Err(ServiceError::not_found("Address", address_id));
    }
    Ok(())
}

/// Loads every product named by `lines`, failing on the first missing one.
async fn load_products<U: ProductRepository>(
    uow: &mut U,
    lines: &[ItemLine],
) -> Result<HashMap<ProductId, Product>> {
    let mut ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
    ids.sort();
    ids.dedup();

    let products: HashMap<ProductId, Product> = uow
        .find_products(&ids)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    if let Some(missing) = ids.iter().find(|id| !products.contains_key(*id)) {
        return Err(ServiceError::not_found("Product", *missing));
    }
    Ok(products)
}

fn product(products: &HashMap<ProductId, Product>, id: ProductId) -> Result<&Product> {
    products
        .get(&id)
        .ok_or_else(|| ServiceError::not_found("Product", id))
}
