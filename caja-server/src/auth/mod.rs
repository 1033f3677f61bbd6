//! 认证模块
//!
//! 会话由托管后端的认证服务签发，本模块负责：
//! - [`SessionManager`] - 登录、登出、令牌解析
//! - [`SessionContext`] - 每个请求的当前会话
//! - [`SessionListener`] - 会话变化通知
//! - [`require_auth`] - 认证中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod session;

pub use jwt::{BackendClaims, JwtError, JwtValidator};
pub use middleware::require_auth;
pub use session::{SessionContext, SessionListener, SessionManager};
