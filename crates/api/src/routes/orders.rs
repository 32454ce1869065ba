//! Order endpoints under `/pedidos`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::{OrderId, Page, PageRequest};
use store::Store;

use crate::AppState;
use crate::dto::{OrderRequest, OrderResponse, OrderUpdateRequest, PageQuery};
use crate::error::ApiError;
use crate::extract::{ValidJson, parse_id};

/// POST /pedidos: places an order with a pending payment.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidJson(req): ValidJson<OrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.orders.insert(req.into()).await?;
    let response = OrderResponse::from(&order);
    let location = match response.id {
        Some(id) => format!("/pedidos/{id}"),
        None => return Err(ApiError::Internal("placed order has no id".to_string())),
    };

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(response)))
}

/// GET /pedidos: paginated, sorted by placement time.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<OrderResponse>>, ApiError> {
    let Query(query) = query?;
    let page = state.orders.find_page(PageRequest::from(query)).await?;
    Ok(Json(page.map(|order| OrderResponse::from(&order))))
}

/// GET /pedidos/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.find_by_id(id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PUT /pedidos/{id}: replaces the order's lines and payment state.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<OrderUpdateRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id: OrderId = parse_id(&id)?;
    let order = state.orders.update(id, req.into()).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// DELETE /pedidos/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: OrderId = parse_id(&id)?;
    state.orders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
