//! Campaign API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/campaigns", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        // 生命周期操作
        .route("/{id}/send", post(handler::send))
        .route("/{id}/cancel", post(handler::cancel))
        // 逐条发送记录
        .route("/{id}/messages", get(handler::messages))
}
