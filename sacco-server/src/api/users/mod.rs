//! User API 模块

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        // 显式角色授权
        .route(
            "/{id}/assignments",
            get(handler::list_assignments).post(handler::assign_role),
        )
        .route(
            "/{id}/assignments/{assignment_id}",
            delete(handler::revoke_assignment),
        )
        // 有效权限与权限检查
        .route("/{id}/permissions", get(handler::effective_permissions))
        .route("/{id}/permissions/check", post(handler::check_permissions))
        .route("/{id}/deactivate", put(handler::deactivate))
}
