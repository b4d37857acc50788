//! Cat Routes
//!
//! 定义猫咪肖像与档案生成的 API 路由。

use crate::api::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建猫咪路由器
pub fn create_cat_router() -> Router<AppState> {
    Router::new()
        .route("/cat-image", get(generate_cat_image))
        .route("/cat-details", post(cat_details))
        .route("/cat-personality", post(cat_personality))
        .route("/cat-dnd-attributes", post(cat_dnd_attributes))
        .route("/cat-basic-info", post(cat_basic_info))
        .route("/cat-backstory-stream", post(cat_backstory_stream))
        .route("/cat-timeline", post(cat_timeline))
}
