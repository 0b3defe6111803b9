use actix_web::{web, HttpResponse, Responder};

use super::order_handler;
use super::AppState;
use crate::metrics;

/// Mount every route. Expects `web::Data<AppState>` and `web::Data<Metrics>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root_handler))
        .route("/health", web::get().to(health_handler))
        .configure(metrics::configure)
        .service(
            web::scope("/orders")
                .route("", web::post().to(order_handler::create))
                .route("", web::get().to(order_handler::list))
                .route("/{id}", web::get().to(order_handler::get_by_id))
                .route("/{id}", web::put().to(order_handler::update_by_id))
                .route("/{id}", web::delete().to(order_handler::delete_by_id)),
        );
}

async fn root_handler() -> impl Responder {
    HttpResponse::Ok().finish()
}

async fn health_handler(state: web::Data<AppState>) -> HttpResponse {
    let backend = state.store.backend_name();

    let response = match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "orders-api",
            "store": backend,
        })),
        Err(e) => {
            tracing::warn!(error = %e, store = backend, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "orders-api",
                "store": backend,
                "error": e.to_string(),
            }))
        }
    };

    state.metrics.record_request("/health", response.status().as_u16());
    response
}
