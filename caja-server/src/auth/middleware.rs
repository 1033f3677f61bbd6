//! 会话校验

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use http::Method;
use serde::Deserialize;

use crate::auth::JwtValidator;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// 无需会话的 API 路径
const PUBLIC_API_PATHS: &[&str] = &["/api/auth/login"];

fn is_public(req: &Request) -> bool {
    let path = req.uri().path();
    req.method() == Method::OPTIONS
        || !path.starts_with("/api/")
        || PUBLIC_API_PATHS.contains(&path)
}

/// 解析访问令牌并注入 [`SessionContext`](crate::auth::SessionContext)
///
/// 令牌来自 `Authorization: Bearer`，或 `?access_token=` (`EventSource` 不能带请求头)。
/// CORS 预检、非 `/api/` 路径和登录接口直接放行。
///
/// 失败时返回 401，错误码区分缺少令牌、令牌过期、令牌无效和会话已结束。
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(&req) {
        return Ok(next.run(req).await);
    }

    let Some(token) = bearer_token(&req) else {
        security_log!("WARN", "auth_missing", path = req.uri().path().to_string());
        return Err(AppError::unauthorized());
    };

    let session = state.sessions.resolve(&token).await.inspect_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            code = e.code.code(),
            path = req.uri().path().to_string()
        );
    })?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// 请求中的访问令牌 (请求头优先)
pub(crate) fn bearer_token(req: &Request) -> Option<String> {
    if let Some(header) = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        return JwtValidator::extract_from_header(header).map(str::to_string);
    }

    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(query)| query.access_token)
        .filter(|token| !token.is_empty())
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}
