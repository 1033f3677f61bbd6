//! 后端 JWT 校验
//!
//! 托管后端签发的访问令牌是 HS256 JWT (`aud = "authenticated"`)。
//! 配置了 `BACKEND_JWT_SECRET` 时在本地校验，省去一次 `/auth/v1/user` 往返。

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use caja_client::AuthUser;

/// 后端令牌的受众
pub const BACKEND_AUDIENCE: &str = "authenticated";

/// 过期判断的时钟容差 (秒)
pub const TOKEN_LEEWAY_SECS: u64 = 60;

/// 访问令牌中的 Claims (只取用到的字段)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendClaims {
    /// 用户 ID
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// 过期时间戳
    pub exp: i64,
}

impl From<BackendClaims> for AuthUser {
    fn from(claims: BackendClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,
}

/// 本地令牌校验器
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[BACKEND_AUDIENCE]);
        validation.set_required_spec_claims(&["sub", "exp", "aud"]);
        validation.leeway = TOKEN_LEEWAY_SECS;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 验证并解码令牌
    pub fn validate(&self, token: &str) -> Result<BackendClaims, JwtError> {
        let token_data =
            decode::<BackendClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    _ => JwtError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn token(secret: &str, aud: &str, exp_offset: Duration) -> String {
        let claims = json!({
            "sub": "8d0c0a9e-1111-2222-3333-444455556666",
            "email": "cajero@demo.com",
            "role": "authenticated",
            "aud": aud,
            "exp": (Utc::now() + exp_offset).timestamp(),
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_backend_token() {
        let validator = JwtValidator::new(SECRET);
        let claims = validator
            .validate(&token(SECRET, BACKEND_AUDIENCE, Duration::hours(1)))
            .unwrap();
        assert_eq!(claims.email.as_deref(), Some("cajero@demo.com"));

        let user = AuthUser::from(claims);
        assert_eq!(user.id, "8d0c0a9e-1111-2222-3333-444455556666");
    }

    #[test]
    fn test_rejects_expired_token() {
        let validator = JwtValidator::new(SECRET);
        let err = validator
            .validate(&token(SECRET, BACKEND_AUDIENCE, Duration::hours(-2)))
            .unwrap_err();
        assert!(matches!(err, JwtError::ExpiredToken));
    }

    #[test]
    fn test_rejects_wrong_secret_and_audience() {
        let validator = JwtValidator::new(SECRET);
        let other = "another-secret-that-is-also-long-enough-1234";
        assert!(matches!(
            validator.validate(&token(other, BACKEND_AUDIENCE, Duration::hours(1))),
            Err(JwtError::InvalidSignature)
        ));
        assert!(matches!(
            validator.validate(&token(SECRET, "anon", Duration::hours(1))),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtValidator::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtValidator::extract_from_header("Bearer "), None);
        assert_eq!(JwtValidator::extract_from_header("Basic abc"), None);
    }
}
