//! Session Extractor
//!
//! Lets protected handlers take a [`SessionContext`] argument directly

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by require_auth
        if let Some(session) = parts.extensions.get::<SessionContext>() {
            return Ok(session.clone());
        }

        let token = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(crate::auth::JwtValidator::extract_from_header)
            .map(str::to_string);

        let Some(token) = token else {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
            return Err(AppError::unauthorized());
        };

        let session = state.sessions.resolve(&token).await?;
        parts.extensions.insert(session.clone());
        Ok(session)
    }
}
