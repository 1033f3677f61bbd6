//! 请求日志
//!
//! 每个请求一个 `request` span (请求 ID、路由模板、会话用户)，
//! 处理器内的日志都挂在该 span 下。查询串不记录，SSE 的令牌在查询串里。

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

use crate::auth::SessionContext;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();

    // 路由模板，避免把 /api/cashier/orders/{id} 的每个 ID 记成不同路径
    let route = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => req.uri().path().to_owned(),
    };
    let span = tracing::info_span!(
        "request",
        id = header(req.headers(), "x-request-id").unwrap_or("-"),
        method = %req.method(),
        route = %route,
        user = req
            .extensions()
            .get::<SessionContext>()
            .map(|s| s.user_id())
            .unwrap_or("anonymous"),
    );
    tracing::debug!(
        parent: &span,
        agent = header(req.headers(), "user-agent").unwrap_or("unknown"),
        "Request started"
    );

    let response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| log_completion(status, elapsed_ms));

    response
}

fn log_completion(status: StatusCode, elapsed_ms: u64) {
    let status_code = status.as_u16();
    if status.is_server_error() || status.is_client_error() {
        tracing::warn!(status = status_code, elapsed_ms, "Request failed");
    } else {
        tracing::info!(status = status_code, elapsed_ms, "Request completed");
    }
}
