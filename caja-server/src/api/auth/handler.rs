//! Authentication Handlers
//!
//! Sign-in and sign-out go through the backend's auth service; the returned
//! access token is the bearer token for every other route.

use axum::{Json, extract::State};
use shared::client::{LoginRequest, LoginResponse, UserInfo};

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::utils::validation::validate_body;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

pub const WELCOME: &str = "Bienvenido 👋";
pub const SIGNED_OUT: &str = "Sesión cerrada";

/// Login handler
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    validate_body(&req)?;

    let session = state
        .sessions
        .sign_in(req.email.trim(), &req.password)
        .await?;

    tracing::info!(user_id = %session.user_id(), "User logged in successfully");

    let response = LoginResponse {
        token: session.access_token.clone(),
        user: user_info(&session),
    };
    ok_with_message(WELCOME, response)
}

/// Logout handler
///
/// 释放该会话的点单台；如果它持有收银订阅则交给其他会话
pub async fn logout(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<ApiResponse<()>> {
    state.sessions.sign_out(&session.access_token).await;
    tracing::info!(user_id = %session.user_id(), "User logged out");
    ok_with_message(SIGNED_OUT, ())
}

/// Current user
pub async fn me(session: SessionContext) -> AppResult<ApiResponse<UserInfo>> {
    ok(user_info(&session))
}

fn user_info(session: &SessionContext) -> UserInfo {
    UserInfo {
        id: session.user.id.clone(),
        email: session.user.email.clone(),
    }
}
