//! Cart API 模块
//!
//! 每个服务员 (按登录用户) 一个购物车，行按下标寻址。

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart))
        .route("/items", post(handler::add_item))
        .route("/items/{index}", delete(handler::remove_line))
        .route("/items/{index}/increment", post(handler::increment))
        .route("/items/{index}/decrement", post(handler::decrement))
        .route("/items/{index}/note", put(handler::set_note))
        .route("/service-type", put(handler::set_service_type))
        .route("/submit", post(handler::submit))
}
