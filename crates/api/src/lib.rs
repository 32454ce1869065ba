//! HTTP API for the storefront.
//!
//! Provides REST endpoints for categories, customers and orders, with
//! structured logging (tracing), Prometheus metrics and problem+json errors.

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use services::{CategoryService, CustomerService, OrderService};

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub categories: CategoryService<S>,
    pub customers: CustomerService<S>,
    pub orders: OrderService<S>,
}

impl<S: Store> AppState<S> {
    /// Builds every service on top of the same store.
    pub fn new(store: S) -> Self {
        Self {
            categories: CategoryService::new(store.clone()),
            customers: CustomerService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{categories, customers, orders};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/categorias",
            get(categories::list::<S>).post(categories::create::<S>),
        )
        .route(
            "/categorias/{id}",
            get(categories::get::<S>)
                .put(categories::update::<S>)
                .delete(categories::delete::<S>),
        )
        .route(
            "/clientes",
            get(customers::list::<S>).post(customers::create::<S>),
        )
        .route(
            "/clientes/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route("/pedidos", get(orders::list::<S>).post(orders::create::<S>))
        .route(
            "/pedidos/{id}",
            get(orders::get::<S>)
                .put(orders::update::<S>)
                .delete(orders::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(error::enrich_problem))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
