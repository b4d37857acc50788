//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use axum::{Router, extract::DefaultBodyLimit};
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.server.max_request_size;
    let api = Router::new().merge(routes::cat_routes::create_cat_router());

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
