//! 路由装配
//!
//! [`build_app`] 同时供 HTTP 服务和集成测试使用。

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::api::{auth, cart, cashier, health, inventory, menu, reports};
use crate::core::ServerState;
use crate::middleware::logging_middleware;

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// 每个请求一个随机 UUID
#[derive(Clone, Copy)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// 所有路由，不含中间件和状态
pub fn build_router() -> Router<ServerState> {
    // 点单台、收银台、管理后台，最后是公开的健康检查
    [
        auth::router(),
        menu::router(),
        cart::router(),
        cashier::router(),
        inventory::router(),
        reports::router(),
        health::router(),
    ]
    .into_iter()
    .fold(Router::new(), Router::merge)
}

/// 完整应用
///
/// 后加的层在外层：请求先经过会话校验 (注入 `SessionContext`)，
/// 再生成请求 ID，之后才到日志中间件。
pub fn build_app(state: &ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(from_fn_with_state(state.clone(), crate::auth::require_auth))
        .with_state(state.clone())
}
