//! Request extractors.

use std::str::FromStr;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::dto::Validate;
use crate::error::ApiError;

/// JSON body that has passed [`Validate`].
///
/// Malformed bodies are rejected with 400, bodies that fail validation with
/// 422 and the failing fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Parses an identifier taken from the request path.
pub fn parse_id<I: FromStr>(raw: &str) -> Result<I, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid identifier: {raw}")))
}

#[cfg(test)]
mod tests {
    use common::OrderId;

    use super::*;

    #[test]
    fn parses_numeric_ids() {
        let id: OrderId = parse_id("42").unwrap();
        assert_eq!(id, OrderId::new(42));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let result = parse_id::<OrderId>("abc");
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
