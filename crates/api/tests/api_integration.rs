//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, seed_reference_data};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// App over an in-memory store holding the reference data: categories 1-2,
/// products 1-3, cities 1-3, customer 1 with addresses 1-2.
async fn setup() -> axum::Router {
    let store = InMemoryStore::new();
    seed_reference_data(&store).await.unwrap();
    let state = Arc::new(api::AppState::new(store));
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn order_body(items: Value) -> Value {
    json!({
        "customer_id": 1,
        "delivery_address_id": 2,
        "payment": { "kind": 1, "installments": 6 },
        "items": items
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    send(&app, "POST", "/categorias", Some(json!({ "name": "Games" }))).await;

    let response = send(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

mod categories {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_location() {
        let app = setup().await;

        let response = send(&app, "POST", "/categorias", Some(json!({ "name": "Games" }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/categorias/3");

        let json = body_json(response).await;
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Games");
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let app = setup().await;

        let response = send(&app, "GET", "/categorias?page=0&size=1", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["content"].as_array().unwrap().len(), 1);
        assert_eq!(json["content"][0]["name"], "Informática");
        assert_eq!(json["total_elements"], 2);
        assert_eq!(json["total_pages"], 2);
        assert_eq!(json["size"], 1);
    }

    #[tokio::test]
    async fn list_descending() {
        let app = setup().await;

        let json = body_json(send(&app, "GET", "/categorias?direction=desc", None).await).await;
        assert_eq!(json["content"][0]["name"], "Escritório");
    }

    #[tokio::test]
    async fn update_then_get() {
        let app = setup().await;

        let response = send(
            &app,
            "PUT",
            "/categorias/2",
            Some(json!({ "name": "Papelaria" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(send(&app, "GET", "/categorias/2", None).await).await;
        assert_eq!(json["name"], "Papelaria");
    }

    #[tokio::test]
    async fn blank_name_is_422_with_field_errors() {
        let app = setup().await;

        let response = send(&app, "POST", "/categorias", Some(json!({ "name": "" }))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );

        let json = body_json(response).await;
        assert_eq!(json["title"], "Validation error");
        assert_eq!(json["status"], 422);
        assert_eq!(json["errors"]["name"], "must not be blank");
        assert_eq!(json["path"], "/categorias");
        assert_eq!(json["method"], "POST");
        assert!(json["trace_id"].as_str().is_some());
        assert!(json["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let app = setup().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/categorias")
                    .header("content-type", "application/json")
                    .body(Body::from("{ not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["title"], "Business rule violation");
    }

    #[tokio::test]
    async fn missing_category_is_404_problem() {
        let app = setup().await;

        let response = send(&app, "GET", "/categorias/99", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["title"], "Resource not found");
        assert_eq!(json["detail"], "Category not found: 99");
        assert_eq!(json["path"], "/categorias/99");
        assert_eq!(json["method"], "GET");
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let app = setup().await;

        let response = send(&app, "GET", "/categorias/abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_referenced_category_is_409() {
        let app = setup().await;

        let response = send(&app, "DELETE", "/categorias/1", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["title"], "Data integrity violation");
    }

    #[tokio::test]
    async fn deleting_unused_category_is_204() {
        let app = setup().await;
        send(&app, "POST", "/categorias", Some(json!({ "name": "Games" }))).await;

        let response = send(&app, "DELETE", "/categorias/3", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", "/categorias/3", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

mod customers {
    use super::*;

    fn customer_body(name: &str, city_id: i64) -> Value {
        json!({
            "name": name,
            "email": "ana@example.com",
            "document": "11122233344",
            "kind": 1,
            "phones": ["34999990000"],
            "street": "Rua Goiás",
            "number": "12",
            "district": "Centro",
            "postal_code": "38400000",
            "city_id": city_id
        })
    }

    #[tokio::test]
    async fn create_and_list_sorted_by_name() {
        let app = setup().await;

        let response = send(&app, "POST", "/clientes", Some(customer_body("Ana Costa", 1))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/clientes/2");

        let created = body_json(response).await;
        assert_eq!(created["kind"], 1);
        assert_eq!(created["addresses"][0]["city_id"], 1);

        let json = body_json(send(&app, "GET", "/clientes", None).await).await;
        let names: Vec<_> = json["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Ana Costa", "Maria Silva"]);
    }

    #[tokio::test]
    async fn unknown_city_is_404() {
        let app = setup().await;

        let response = send(&app, "POST", "/clientes", Some(customer_body("Ana Costa", 77))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_customer_reports_every_field() {
        let app = setup().await;

        let response = send(
            &app,
            "POST",
            "/clientes",
            Some(json!({ "email": "nope", "kind": 9 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        let errors = json["errors"].as_object().unwrap();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("document"));
        assert!(errors.contains_key("kind"));
    }

    #[tokio::test]
    async fn update_changes_name_and_email() {
        let app = setup().await;

        let response = send(
            &app,
            "PUT",
            "/clientes/1",
            Some(json!({ "name": "Maria Souza", "email": "maria.souza@gmail.com" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["name"], "Maria Souza");
        assert_eq!(json["document"], "36378912377");
        assert_eq!(json["addresses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn customer_with_orders_cannot_be_deleted() {
        let app = setup().await;
        let response = send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([{ "product_id": 1, "quantity": 1 }]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app, "DELETE", "/clientes/1", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        send(&app, "DELETE", "/pedidos/1", None).await;
        let response = send(&app, "DELETE", "/clientes/1", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn create_merges_lines_and_reports_total() {
        let app = setup().await;

        let response = send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([
                { "product_id": 3, "quantity": 1 },
                { "product_id": 1, "quantity": 1 },
                { "product_id": 3, "quantity": 1 }
            ]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/pedidos/1");

        let json = body_json(response).await;
        assert_eq!(json["customer_id"], 1);
        assert_eq!(json["delivery_address_id"], 2);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["items"][1]["product_name"], "Mouse");
        assert_eq!(json["items"][1]["quantity"], 2);
        assert_eq!(json["total_cents"], 216_000);
        assert_eq!(json["payment"]["state"], 1);
        assert_eq!(json["payment"]["kind"], 1);
        assert_eq!(json["payment"]["installments"], 6);
    }

    #[tokio::test]
    async fn update_reconciles_lines() {
        let app = setup().await;
        send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([
                { "product_id": 1, "quantity": 1 },
                { "product_id": 3, "quantity": 1 }
            ]))),
        )
        .await;

        let response = send(
            &app,
            "PUT",
            "/pedidos/1",
            Some(json!({
                "customer_id": 1,
                "delivery_address_id": 1,
                "payment_state": 2,
                "items": [
                    { "product_id": 1, "quantity": 2 },
                    { "product_id": 2, "quantity": 3 }
                ]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(send(&app, "GET", "/pedidos/1", None).await).await;
        let lines: Vec<(i64, i64)> = json["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| {
                (
                    i["product_id"].as_i64().unwrap(),
                    i["quantity"].as_i64().unwrap(),
                )
            })
            .collect();
        assert_eq!(lines, [(1, 2), (2, 3)]);
        assert_eq!(json["payment"]["state"], 2);
        assert_eq!(json["delivery_address_id"], 1);
        assert_eq!(json["total_cents"], 640_000);
    }

    #[tokio::test]
    async fn unknown_payment_kind_is_400() {
        let app = setup().await;

        let mut body = order_body(json!([{ "product_id": 1, "quantity": 1 }]));
        body["payment"]["kind"] = json!(5);
        let response = send(&app, "POST", "/pedidos", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["title"], "Business rule violation");
        assert_eq!(json["detail"], "Invalid payment kind code: 5");
    }

    #[tokio::test]
    async fn non_positive_quantity_is_400() {
        let app = setup().await;

        let response = send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([{ "product_id": 1, "quantity": 0 }]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(send(&app, "GET", "/pedidos", None).await).await;
        assert_eq!(json["total_elements"], 0);
    }

    #[tokio::test]
    async fn merged_quantity_overflow_is_400() {
        let app = setup().await;

        let response = send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([
                { "product_id": 3, "quantity": i32::MAX },
                { "product_id": 3, "quantity": 1 }
            ]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(send(&app, "GET", "/pedidos", None).await).await;
        assert_eq!(json["total_elements"], 0);
    }

    #[tokio::test]
    async fn empty_items_are_422() {
        let app = setup().await;

        let response = send(&app, "POST", "/pedidos", Some(order_body(json!([])))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["errors"]["items"], "must not be empty");
    }

    #[tokio::test]
    async fn unknown_product_is_404() {
        let app = setup().await;

        let response = send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([{ "product_id": 50, "quantity": 1 }]))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_204_then_404() {
        let app = setup().await;
        send(
            &app,
            "POST",
            "/pedidos",
            Some(order_body(json!([{ "product_id": 2, "quantity": 1 }]))),
        )
        .await;

        let response = send(&app, "DELETE", "/pedidos/1", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, "GET", "/pedidos/1", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
