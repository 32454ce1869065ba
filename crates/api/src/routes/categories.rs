//! Category CRUD endpoints under `/categorias`.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::{CategoryId, Page, PageRequest};
use store::Store;

use crate::AppState;
use crate::dto::{CategoryRequest, CategoryResponse, PageQuery};
use crate::error::ApiError;
use crate::extract::{ValidJson, parse_id};

/// POST /categorias
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.categories.insert(req.into()).await?;
    let location = format!("/categorias/{}", category.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CategoryResponse::from(category)),
    ))
}

/// GET /categorias
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<CategoryResponse>>, ApiError> {
    let Query(query) = query?;
    let page = state
        .categories
        .find_page(PageRequest::from(query))
        .await?;
    Ok(Json(page.map(CategoryResponse::from)))
}

/// GET /categorias/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    let category = state.categories.find_by_id(id).await?;
    Ok(Json(category.into()))
}

/// PUT /categorias/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    let category = state.categories.update(id, req.into()).await?;
    Ok(Json(category.into()))
}

/// DELETE /categorias/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    state.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
