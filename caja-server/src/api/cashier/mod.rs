//! Cashier API 模块
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/cashier/orders | GET | 未付款订单 (按下单时间倒序) |
//! | /api/cashier/orders/{id}/pay | POST | 标记已付款 |
//! | /api/cashier/stream | GET | 未付款订单推送 (SSE，`orders` 事件) |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cashier", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list_orders))
        .route("/orders/{id}/pay", post(handler::pay))
        .route("/stream", get(handler::stream))
}
