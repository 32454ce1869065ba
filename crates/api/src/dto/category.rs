use common::CategoryId;
use domain::{Category, NewCategory};
use serde::{Deserialize, Serialize};

use super::{FieldErrors, Validate};

/// Body of `POST /categorias` and `PUT /categorias/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: String,
}

impl Validate for CategoryRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", &self.name);
        let len = self.name.trim().chars().count();
        if !(3..=100).contains(&len) {
            errors.add("name", "length must be between 3 and 100 characters");
        }
        errors.into_result()
    }
}

impl From<CategoryRequest> for NewCategory {
    fn from(request: CategoryRequest) -> Self {
        NewCategory::new(request.name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}
