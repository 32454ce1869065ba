//! Catalog entities: categories and products.

use common::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};

use crate::Money;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Overwrites the mutable fields from a request.
    pub fn apply(&mut self, changes: NewCategory) {
        self.name = changes.name;
    }
}

/// Fields needed to create (or fully update) a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A sellable product. Products and categories are many-to-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Current list price; order items capture it when they are created.
    pub price: Money,
    pub category_ids: Vec<CategoryId>,
}

impl Product {
    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }
}

/// Fields needed to create a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category_ids: Vec<CategoryId>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money, category_ids: Vec<CategoryId>) -> Self {
        Self {
            name: name.into(),
            price,
            category_ids,
        }
    }
}
