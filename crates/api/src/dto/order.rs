use chrono::{DateTime, NaiveDate, Utc};
use common::{AddressId, CustomerId, OrderId, ProductId};
use domain::{Order, OrderItem, Payment, PaymentMethod};
use serde::{Deserialize, Serialize};

use super::{FieldErrors, Validate};
use crate::services::{ItemLine, OrderChanges, PlaceOrder};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

impl From<ItemRequest> for ItemLine {
    fn from(item: ItemRequest) -> Self {
        ItemLine {
            product_id: ProductId::new(item.product_id),
            quantity: item.quantity,
        }
    }
}

/// Payment part of `POST /pedidos`: the kind code (1 card, 2 bank slip) and,
/// for cards, an optional number of installments.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    pub kind: i32,
    pub installments: Option<i32>,
}

/// Body of `POST /pedidos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
    pub customer_id: i64,
    pub delivery_address_id: i64,
    pub payment: PaymentRequest,
    pub items: Vec<ItemRequest>,
}

impl Validate for OrderRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.items.is_empty() {
            errors.add("items", "must not be empty");
        }
        errors.into_result()
    }
}

impl From<OrderRequest> for PlaceOrder {
    fn from(request: OrderRequest) -> Self {
        PlaceOrder {
            customer_id: CustomerId::new(request.customer_id),
            delivery_address_id: AddressId::new(request.delivery_address_id),
            payment_kind: request.payment.kind,
            installments: request.payment.installments,
            items: request.items.into_iter().map(ItemLine::from).collect(),
        }
    }
}

/// Body of `PUT /pedidos/{id}`. `items` replaces the order's lines.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderUpdateRequest {
    pub customer_id: i64,
    pub delivery_address_id: i64,
    pub payment_state: i32,
    pub items: Vec<ItemRequest>,
}

impl Validate for OrderUpdateRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.items.is_empty() {
            errors.add("items", "must not be empty");
        }
        errors.into_result()
    }
}

impl From<OrderUpdateRequest> for OrderChanges {
    fn from(request: OrderUpdateRequest) -> Self {
        OrderChanges {
            customer_id: CustomerId::new(request.customer_id),
            delivery_address_id: AddressId::new(request.delivery_address_id),
            payment_state: request.payment_state,
            items: request.items.into_iter().map(ItemLine::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            discount_cents: item.discount.cents(),
            subtotal_cents: item.subtotal().cents(),
        }
    }
}

/// Payment as returned to clients: the state plus the variant's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub state: i32,
    pub state_description: String,
    pub kind: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        let (installments, due_date, paid_date) = match payment.method() {
            PaymentMethod::Card { installments } => (*installments, None, None),
            PaymentMethod::BankSlip {
                due_date,
                paid_date,
            } => (None, *due_date, *paid_date),
        };
        Self {
            state: payment.state().code(),
            state_description: payment.state().description().to_string(),
            kind: payment.kind().code(),
            installments,
            due_date,
            paid_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Option<OrderId>,
    pub placed_at: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub delivery_address_id: AddressId,
    pub payment: Option<PaymentResponse>,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            placed_at: order.placed_at(),
            customer_id: order.customer_id(),
            delivery_address_id: order.delivery_address_id(),
            payment: order.payment().map(PaymentResponse::from),
            items: order.items().map(OrderItemResponse::from).collect(),
            total_cents: order.total().cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, PaymentKind, Product};

    use super::*;

    #[test]
    fn empty_items_fail_validation() {
        let errors = OrderRequest::default().validate().unwrap_err();
        assert_eq!(errors.get("items"), Some("must not be empty"));

        let errors = OrderUpdateRequest::default().validate().unwrap_err();
        assert_eq!(errors.get("items"), Some("must not be empty"));
    }

    #[test]
    fn response_carries_lines_payment_and_total() {
        let mouse = Product {
            id: ProductId::new(3),
            name: "Mouse".to_string(),
            price: Money::from_units(80),
            category_ids: vec![],
        };
        let mut order = Order::new(CustomerId::new(1), AddressId::new(2), Utc::now());
        order.attach_payment(Payment::pending(PaymentKind::Card, Some(10)));
        order.add_item(&mouse, 2).unwrap();
        order.assign_id(OrderId::new(7));

        let response = OrderResponse::from(&order);
        assert_eq!(response.id, Some(OrderId::new(7)));
        assert_eq!(response.total_cents, 16_000);
        assert_eq!(response.items[0].subtotal_cents, 16_000);
        assert_eq!(response.items[0].product_name, "Mouse");

        let payment = response.payment.unwrap();
        assert_eq!(payment.kind, 1);
        assert_eq!(payment.state, 1);
        assert_eq!(payment.installments, Some(10));
        assert_eq!(payment.due_date, None);
    }

    #[test]
    fn bank_slip_payment_omits_card_fields() {
        let payment = Payment::pending(PaymentKind::BankSlip, None);
        let json = serde_json::to_value(PaymentResponse::from(&payment)).unwrap();
        assert_eq!(json["kind"], 2);
        assert!(json.get("installments").is_none());
    }
}
