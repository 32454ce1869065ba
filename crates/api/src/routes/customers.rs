//! Customer CRUD endpoints under `/clientes`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::{CustomerId, Page, PageRequest};
use domain::NewCustomer;
use store::Store;

use crate::AppState;
use crate::dto::{CustomerRequest, CustomerResponse, CustomerUpdateRequest, PageQuery};
use crate::error::ApiError;
use crate::extract::{ValidJson, parse_id};

/// POST /clientes: creates a customer with its phones and first address.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidJson(req): ValidJson<CustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.customers.insert(NewCustomer::try_from(req)?).await?;
    let location = format!("/clientes/{}", customer.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CustomerResponse::from(customer)),
    ))
}

/// GET /clientes: paginated, sorted by name.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<CustomerResponse>>, ApiError> {
    let Query(query) = query?;
    let page = state.customers.find_page(PageRequest::from(query)).await?;
    Ok(Json(page.map(CustomerResponse::from)))
}

/// GET /clientes/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    let customer = state.customers.find_by_id(id).await?;
    Ok(Json(customer.into()))
}

/// PUT /clientes/{id}: changes name and email.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CustomerUpdateRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    let customer = state.customers.update(id, req.into()).await?;
    Ok(Json(customer.into()))
}

/// DELETE /clientes/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CustomerId = parse_id(&id)?;
    state.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
