//! Request and response bodies, their mappers and request validation.

pub mod category;
pub mod customer;
pub mod order;
pub mod page;

use std::collections::BTreeMap;

use serde::Serialize;

pub use category::{CategoryRequest, CategoryResponse};
pub use customer::{AddressResponse, CustomerRequest, CustomerResponse, CustomerUpdateRequest};
pub use order::{
    ItemRequest, OrderItemResponse, OrderRequest, OrderResponse, OrderUpdateRequest,
    PaymentRequest, PaymentResponse,
};
pub use page::PageQuery;

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already failed.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn not_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "must not be blank");
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        self.not_blank(field, value);
        if !value.contains('@') {
            self.add(field, "must be a valid email address");
        }
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Constraint checks run on a request body before it reaches a service.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}
