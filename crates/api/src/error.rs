//! API error types with HTTP response mapping.
//!
//! Every error is answered with an `application/problem+json` body. Handlers
//! do not see the request path and method, so [`enrich_problem`] fills them in
//! after the handler ran.

use axum::extract::Request;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use domain::UnknownCode;
use serde::Serialize;
use store::StoreError;
use uuid::Uuid;

use crate::dto::FieldErrors;
use crate::services::ServiceError;

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// The request broke a business rule or could not be parsed.
    BadRequest(String),
    /// The request body failed validation.
    Validation(FieldErrors),
    /// A write would break data integrity.
    Conflict(String),
    /// Internal server error. The message is logged, never returned.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Resource not found",
            ApiError::BadRequest(_) => "Business rule violation",
            ApiError::Validation(_) => "Validation error",
            ApiError::Conflict(_) => "Data integrity violation",
            ApiError::Internal(_) => "Unexpected internal error",
        }
    }
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub title: &'static str,
    pub detail: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl Problem {
    fn render(&self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            axum::Json(self),
        )
            .into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let title = self.title();
        let trace_id = Uuid::new_v4().simple().to_string();

        let (detail, errors) = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Conflict(msg) => {
                tracing::warn!(status = status.as_u16(), %trace_id, error = %msg, "request failed");
                (msg, None)
            }
            ApiError::Validation(errors) => {
                tracing::warn!(%trace_id, fields = errors.len(), "request failed validation");
                ("One or more fields are invalid".to_string(), Some(errors))
            }
            ApiError::Internal(msg) => {
                tracing::error!(%trace_id, error = %msg, "internal server error");
                (
                    "An unexpected error occurred. Please contact support".to_string(),
                    None,
                )
            }
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        let problem = Problem {
            title,
            detail,
            status: status.as_u16(),
            timestamp: Utc::now(),
            path: None,
            method: None,
            trace_id,
            errors,
        };
        let mut response = problem.render();
        response.extensions_mut().insert(problem);
        response
    }
}

/// Middleware that stamps the request path and method on problem responses.
pub async fn enrich_problem(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<Problem>() {
        Some(mut problem) => {
            problem.path = Some(path);
            problem.method = Some(method);
            problem.render()
        }
        None => response,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ServiceError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            ServiceError::Order(err) => ApiError::Internal(err.to_string()),
            ServiceError::Store(StoreError::Conflict(msg)) => ApiError::Conflict(msg),
            ServiceError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<UnknownCode> for ApiError {
    fn from(err: UnknownCode) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use domain::OrderError;

    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::not_found("Order", 1), StatusCode::NOT_FOUND),
            (
                ServiceError::InvalidArgument("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Store(StoreError::Conflict("fk".to_string())),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Order(OrderError::MissingPayment),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let response = ApiError::Internal("connection refused".to_string()).into_response();
        let problem = response.extensions().get::<Problem>().unwrap();
        assert_eq!(problem.status, 500);
        assert!(!problem.detail.contains("connection refused"));
    }

    #[test]
    fn problem_uses_problem_json_content_type() {
        let response = ApiError::NotFound("Order not found: 1".to_string()).into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            PROBLEM_CONTENT_TYPE
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
