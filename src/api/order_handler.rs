use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::domain::order::{FindAllPage, LineItem, Order, OrderStatus, RepositoryError};
use crate::storage::Cursor;

// ============================================================================
// Order Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<Cursor>,
}

const ROUTE_ORDERS: &str = "/orders";
const ROUTE_ORDER: &str = "/orders/{id}";

fn finish(state: &AppState, route: &str, response: HttpResponse) -> HttpResponse {
    state.metrics.record_request(route, response.status().as_u16());
    response
}

fn error_body(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "error": message.into() })
}

fn parse_id(raw: &str) -> Result<u64, HttpResponse> {
    raw.parse::<u64>().map_err(|_| {
        HttpResponse::BadRequest().json(error_body(format!("invalid order id '{}'", raw)))
    })
}

fn repository_failure(err: RepositoryError) -> HttpResponse {
    if err.is_not_found() {
        HttpResponse::NotFound().json(error_body(err.to_string()))
    } else if err.is_already_exists() {
        HttpResponse::Conflict().json(error_body(err.to_string()))
    } else if err.is_invalid_cursor() {
        HttpResponse::BadRequest().json(error_body(err.to_string()))
    } else {
        tracing::error!(error = %err, kind = err.kind(), "Repository call failed");
        HttpResponse::InternalServerError().json(error_body("internal server error"))
    }
}

/// POST /orders
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let order = Order::new(rand::random::<u64>(), body.customer_id, body.line_items, Utc::now());

    let response = match state.repo.insert(&order).await {
        Ok(()) => HttpResponse::Created().json(&order),
        Err(e) => repository_failure(e),
    };
    finish(&state, ROUTE_ORDERS, response)
}

/// GET /orders?cursor=<opaque>
pub async fn list(state: web::Data<AppState>, query: web::Query<ListQuery>) -> HttpResponse {
    let page = match query.into_inner().cursor.filter(|c| !c.is_empty()) {
        Some(cursor) => FindAllPage::after(Cursor::new(cursor), state.page_size),
        None => FindAllPage::first(state.page_size),
    };

    let response = match state.repo.find_all(&page).await {
        Ok(result) => HttpResponse::Ok().json(ListResponse {
            items: result.orders,
            next: result.cursor,
        }),
        Err(e) => repository_failure(e),
    };
    finish(&state, ROUTE_ORDERS, response)
}

/// GET /orders/{id}
pub async fn get_by_id(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return finish(&state, ROUTE_ORDER, response),
    };

    let response = match state.repo.find_by_id(id).await {
        Ok(order) => HttpResponse::Ok().json(&order),
        Err(e) => repository_failure(e),
    };
    finish(&state, ROUTE_ORDER, response)
}

/// PUT /orders/{id} with `{"status": "shipped" | "completed"}`
pub async fn update_by_id(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateOrderRequest>,
) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return finish(&state, ROUTE_ORDER, response),
    };

    let mut order = match state.repo.find_by_id(id).await {
        Ok(order) => order,
        Err(e) => return finish(&state, ROUTE_ORDER, repository_failure(e)),
    };

    if let Err(e) = order.advance(body.status, Utc::now()) {
        tracing::debug!(order_id = id, error = %e, "Rejected status change");
        return finish(
            &state,
            ROUTE_ORDER,
            HttpResponse::BadRequest().json(error_body(e.to_string())),
        );
    }

    let response = match state.repo.update(&order).await {
        Ok(()) => HttpResponse::Ok().json(&order),
        Err(e) => repository_failure(e),
    };
    finish(&state, ROUTE_ORDER, response)
}

/// DELETE /orders/{id}
pub async fn delete_by_id(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path) {
        Ok(id) => id,
        Err(response) => return finish(&state, ROUTE_ORDER, response),
    };

    let response = match state.repo.delete_by_id(id).await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => repository_failure(e),
    };
    finish(&state, ROUTE_ORDER, response)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure;
    use crate::domain::order::OrderRepository;
    use crate::metrics::Metrics;
    use crate::storage::MemoryStore;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn state(page_size: usize) -> (web::Data<AppState>, web::Data<Metrics>) {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let state = AppState {
            repo: OrderRepository::new(store.clone()).with_metrics(metrics.clone()),
            store,
            metrics: metrics.clone(),
            page_size,
        };
        (web::Data::new(state), web::Data::from(metrics))
    }

    macro_rules! app {
        ($page_size:expr) => {{
            let (state, metrics) = state($page_size);
            test::init_service(
                App::new()
                    .app_data(state)
                    .app_data(metrics)
                    .configure(configure),
            )
            .await
        }};
    }

    fn create_body() -> serde_json::Value {
        serde_json::json!({
            "customer_id": Uuid::new_v4(),
            "line_items": [
                { "item_id": Uuid::new_v4(), "quantity": 2, "price": 500 }
            ]
        })
    }

    #[actix_web::test]
    async fn test_root_is_ok() {
        let app = app!(50);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_create_then_get() {
        let app = app!(50);

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(create_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Order = test::read_body_json(resp).await;
        assert!(created.created_at.is_some());
        assert_eq!(created.line_items.len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/orders/{}", created.order_id))
            .to_request();
        let fetched: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, created);
    }

    #[actix_web::test]
    async fn test_get_with_bad_id_is_bad_request() {
        let app = app!(50);
        let req = test::TestRequest::get().uri("/orders/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_get_missing_is_not_found() {
        let app = app!(50);
        let req = test::TestRequest::get().uri("/orders/12345").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_status_transitions() {
        let app = app!(50);
        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(create_body())
            .to_request();
        let created: Order = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/orders/{}", created.order_id);

        // Completing before shipping is rejected
        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(serde_json::json!({ "status": "completed" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(serde_json::json!({ "status": "shipped" }))
            .to_request();
        let shipped: Order = test::call_and_read_body_json(&app, req).await;
        assert!(shipped.shipped_at.is_some());

        let req = test::TestRequest::put()
            .uri(&uri)
            .set_json(serde_json::json!({ "status": "completed" }))
            .to_request();
        let completed: Order = test::call_and_read_body_json(&app, req).await;
        assert!(completed.completed_at >= completed.shipped_at);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let stored: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored, completed);
    }

    #[actix_web::test]
    async fn test_unknown_status_is_bad_request() {
        let app = app!(50);
        let req = test::TestRequest::put()
            .uri("/orders/1")
            .set_json(serde_json::json!({ "status": "teleported" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_update_missing_is_not_found() {
        let app = app!(50);
        let req = test::TestRequest::put()
            .uri("/orders/1")
            .set_json(serde_json::json!({ "status": "shipped" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_then_get_is_not_found() {
        let app = app!(50);
        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(create_body())
            .to_request();
        let created: Order = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/orders/{}", created.order_id);

        let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_follows_cursor_to_the_end() {
        let app = app!(2);
        for _ in 0..5 {
            let req = test::TestRequest::post()
                .uri("/orders")
                .set_json(create_body())
                .to_request();
            test::call_service(&app, req).await;
        }

        let mut seen = std::collections::HashSet::new();
        let mut uri = "/orders".to_string();
        loop {
            let req = test::TestRequest::get().uri(&uri).to_request();
            let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            for item in page["items"].as_array().unwrap() {
                seen.insert(item["order_id"].as_u64().unwrap());
            }
            match page.get("next").and_then(|n| n.as_str()) {
                Some(next) => uri = format!("/orders?cursor={}", next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 5);
    }

    #[::core::prelude::v1::test]
    fn test_repository_failures_map_to_status() {
        let key = || "order:1".to_string();
        let status = |err| repository_failure(err).status();

        assert_eq!(status(RepositoryError::NotFound { key: key() }), StatusCode::NOT_FOUND);
        assert_eq!(status(RepositoryError::AlreadyExists { key: key() }), StatusCode::CONFLICT);
        assert_eq!(
            status(RepositoryError::InvalidCursor {
                cursor: "zzz".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RepositoryError::Store {
                operation: "insert",
                key: key(),
                source: crate::storage::StoreError::Backend("connection reset".to_string()),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_health_reports_store() {
        let app = app!(50);
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "memory");
    }
}
