// HTTP 接口模块

pub mod cli;
pub mod separate;
pub mod system;

use crate::utils::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// 构建路由
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = match state.config.server.max_upload_mb {
        Some(mb) => DefaultBodyLimit::max((mb as usize).saturating_mul(1024 * 1024)),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(system::read_root))
        .route("/separate/", post(separate::separate_audio))
        .route("/separate", post(separate::separate_audio))
        .layer(body_limit)
        .with_state(state)
}
