//! 登录接口的请求/响应类型

use serde::{Deserialize, Serialize};
use validator::Validate;

/// `POST /api/auth/login`
///
/// 两个字段都只检查非空，格式交给后端判断。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email requerido"))]
    pub email: String,
    #[validate(length(min = 1, message = "Contraseña requerida"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// 后端签发的访问令牌，之后作为 Bearer 令牌使用
    pub token: String,
    pub user: UserInfo,
}

/// 已登录的员工 (`GET /api/auth/me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}
