// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        engagements::engagement_handler, payments::payment_handler, providers::provider_handler,
        tasks::task_handler, verification::verification_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/tasks", task_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/engagements",
            engagement_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/providers",
            provider_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/documents",
            verification_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/payments",
            payment_handler().layer(middleware::from_fn(auth)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
