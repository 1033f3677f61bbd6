//! Inventory API 模块
//!
//! 分类和菜品管理。请求和响应体使用后端的列名 (`nombre`, `precio` ...)。

mod handler;

use axum::{
    Router,
    routing::{delete, get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/categories",
            get(handler::list_categories).post(handler::create_category),
        )
        .route("/categories/{id}", delete(handler::delete_category))
        .route("/items", get(handler::list_items).post(handler::create_item))
        .route(
            "/items/{id}",
            patch(handler::update_item).delete(handler::delete_item),
        )
}
