//! 会话管理
//!
//! 登录后的会话以访问令牌为键保存在 [`SessionManager`] 中。每个请求通过
//! [`SessionContext`] 显式拿到当前用户和以其身份访问后端的客户端，
//! 不依赖任何全局会话状态。
//!
//! 会话变化 (登录/登出) 通过 [`SessionListener`] 通知各视图：
//! 收银监控在第一个会话出现时订阅订单变化，点单台在用户最后一个会话
//! 结束时清理购物车。
//!
//! 每个会话记录令牌的过期时间。过期的会话在下一次命中或定期清理时移除，
//! 移除和登出一样通知监听器。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use caja_client::{AuthUser, Backend, ClientError};

use crate::auth::jwt::{JwtError, JwtValidator, TOKEN_LEEWAY_SECS};
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode, surface};

/// 当前会话上下文
///
/// 由认证中间件注入请求扩展，处理函数直接作为参数提取。
#[derive(Clone)]
pub struct SessionContext {
    /// 已登录用户
    pub user: AuthUser,
    /// 后端访问令牌
    pub access_token: String,
    /// 以该用户身份访问后端的客户端
    pub backend: Backend,
    pub signed_in_at: DateTime<Utc>,
    /// 访问令牌过期时间
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// 与 JWT 校验使用相同的时钟容差
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at + Duration::seconds(TOKEN_LEEWAY_SECS as i64)
    }
}

/// 令牌未带过期信息时假定的有效期 (后端默认一小时)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("user", &self.user)
            .field("signed_in_at", &self.signed_in_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// 会话变化监听器
pub trait SessionListener: Send + Sync {
    /// 新会话建立 (登录或首次识别出令牌)
    fn on_sign_in(&self, session: &SessionContext);

    /// 会话结束；`remaining` 是仍然存活的会话
    fn on_sign_out(&self, session: &SessionContext, remaining: &[SessionContext]);
}

/// 会话管理器
pub struct SessionManager {
    backend: Backend,
    sessions: DashMap<String, SessionContext>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
    jwt: Option<JwtValidator>,
}

impl SessionManager {
    /// `jwt` 为空时令牌通过认证服务校验
    pub fn new(backend: Backend, jwt: Option<JwtValidator>) -> Self {
        Self {
            backend,
            sessions: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            jwt,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.write().push(listener);
    }

    /// 邮箱密码登录
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionContext> {
        let session = match self.backend.auth.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => {
                security_log!("WARN", "login_failed", email = email.to_string());
                return Err(surface(
                    e,
                    ErrorCode::InvalidCredentials,
                    "Error al iniciar sesión",
                ));
            }
        };

        security_log!(
            "INFO",
            "login_success",
            user_id = session.user.id.clone(),
            email = email.to_string()
        );
        let ttl = session.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let expires_at = Utc::now() + Duration::seconds(ttl);
        Ok(self.register(session.user, session.access_token, expires_at))
    }

    /// 登出；返回令牌对应的会话是否存在
    ///
    /// 认证服务撤销失败只记录日志，本地会话照常移除。
    pub async fn sign_out(&self, access_token: &str) -> bool {
        if let Err(e) = self.backend.auth.sign_out(access_token).await {
            tracing::warn!(error = %e, "Backend sign-out failed");
        }

        self.end_session(access_token, "logout").is_some()
    }

    /// 把 Bearer 令牌解析为会话
    ///
    /// 已知且未过期的令牌直接命中；已过期的会话被移除并返回 `TokenExpired`。
    /// 未知令牌在本地 (JWT) 或通过认证服务校验后登记。
    pub async fn resolve(&self, access_token: &str) -> AppResult<SessionContext> {
        let cached = self.sessions.get(access_token).map(|entry| entry.value().clone());
        if let Some(session) = cached {
            if !session.is_expired(Utc::now()) {
                return Ok(session);
            }
            self.end_session(access_token, "session_expired");
            return Err(AppError::token_expired());
        }

        let (user, expires_at) = match &self.jwt {
            Some(validator) => match validator.validate(access_token) {
                Ok(claims) => {
                    let Some(expires_at) = DateTime::from_timestamp(claims.exp, 0) else {
                        return Err(AppError::invalid_token("Invalid exp claim"));
                    };
                    (AuthUser::from(claims), expires_at)
                }
                Err(JwtError::ExpiredToken) => return Err(AppError::token_expired()),
                Err(e) => return Err(AppError::invalid_token(e.to_string())),
            },
            None => match self.backend.auth.user(access_token).await {
                Ok(user) => (user, Utc::now() + Duration::seconds(DEFAULT_TOKEN_TTL_SECS)),
                Err(ClientError::Unauthorized) => {
                    return Err(AppError::invalid_token("Invalid token"));
                }
                Err(e) => return Err(surface(e, ErrorCode::BackendError, "Error de sesión")),
            },
        };

        self.prune_expired();
        Ok(self.register(user, access_token.to_string(), expires_at))
    }

    /// 移除所有已过期的会话；返回移除数量
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        expired
            .iter()
            .filter(|token| self.end_session(token, "session_expired").is_some())
            .count()
    }

    /// 当前所有会话
    pub fn sessions(&self) -> Vec<SessionContext> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn register(
        &self,
        user: AuthUser,
        access_token: String,
        expires_at: DateTime<Utc>,
    ) -> SessionContext {
        let session = SessionContext {
            backend: self.backend.authorized(&access_token),
            user,
            access_token: access_token.clone(),
            signed_in_at: Utc::now(),
            expires_at,
        };

        // 并发解析同一令牌时只通知一次
        let inserted = match self.sessions.entry(access_token) {
            Entry::Occupied(existing) => return existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(session).clone(),
        };

        tracing::debug!(user_id = %inserted.user.id, sessions = self.sessions.len(), "Session registered");
        for listener in self.listeners() {
            listener.on_sign_in(&inserted);
        }
        inserted
    }

    /// 移除会话并通知监听器
    fn end_session(&self, access_token: &str, event: &str) -> Option<SessionContext> {
        let (_, session) = self.sessions.remove(access_token)?;

        security_log!("INFO", event, user_id = session.user.id.clone());
        let remaining = self.sessions();
        for listener in self.listeners() {
            listener.on_sign_out(&session, &remaining);
        }
        Some(session)
    }

    fn listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners.read().clone()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .field("local_jwt", &self.jwt.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caja_client::memory::MemoryBackend;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SessionListener for Recorder {
        fn on_sign_in(&self, session: &SessionContext) {
            self.events.lock().push(format!("in:{}", session.user_id()));
        }

        fn on_sign_out(&self, session: &SessionContext, remaining: &[SessionContext]) {
            self.events
                .lock()
                .push(format!("out:{}:{}", session.user_id(), remaining.len()));
        }
    }

    fn manager() -> (MemoryBackend, SessionManager, Arc<Recorder>) {
        let memory = MemoryBackend::new();
        let manager = SessionManager::new(Backend::in_process(&memory), None);
        let recorder = Arc::new(Recorder::default());
        manager.add_listener(recorder.clone());
        (memory, manager, recorder)
    }

    #[tokio::test]
    async fn test_sign_in_registers_and_notifies() {
        let (memory, manager, recorder) = manager();
        let user = memory.add_user("mesero@demo.com", "secreto");

        let session = manager.sign_in("mesero@demo.com", "secreto").await.unwrap();
        assert_eq!(session.user, user);
        assert_eq!(manager.session_count(), 1);
        assert_eq!(*recorder.events.lock(), vec![format!("in:{}", user.id)]);

        // 再次解析同一令牌不会重复通知
        manager.resolve(&session.access_token).await.unwrap();
        assert_eq!(recorder.events.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_failure_keeps_backend_message() {
        let (memory, manager, recorder) = manager();
        memory.add_user("mesero@demo.com", "secreto");

        let err = manager.sign_in("mesero@demo.com", "mal").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert_eq!(err.message, "Error al iniciar sesión");
        assert_eq!(err.description(), Some("Invalid login credentials"));
        assert_eq!(manager.session_count(), 0);
        assert!(recorder.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_reports_remaining_sessions() {
        let (memory, manager, recorder) = manager();
        let user = memory.add_user("cajero@demo.com", "secreto");

        let first = manager.sign_in("cajero@demo.com", "secreto").await.unwrap();
        let _second = manager.sign_in("cajero@demo.com", "secreto").await.unwrap();

        assert!(manager.sign_out(&first.access_token).await);
        assert!(!manager.sign_out(&first.access_token).await);
        assert_eq!(manager.session_count(), 1);
        assert_eq!(
            recorder.events.lock().last().cloned(),
            Some(format!("out:{}:1", user.id))
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted_on_hit() {
        let (memory, manager, recorder) = manager();
        let user = memory.add_user("mesero@demo.com", "secreto");
        let session = manager.sign_in("mesero@demo.com", "secreto").await.unwrap();
        assert!(session.expires_at > Utc::now() + Duration::minutes(59));

        manager
            .sessions
            .get_mut(&session.access_token)
            .unwrap()
            .expires_at = Utc::now() - Duration::minutes(5);

        let err = manager.resolve(&session.access_token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
        assert_eq!(manager.session_count(), 0);
        assert_eq!(
            recorder.events.lock().last().cloned(),
            Some(format!("out:{}:0", user.id))
        );
    }

    #[tokio::test]
    async fn test_prune_expired_sessions() {
        let (memory, manager, recorder) = manager();
        memory.add_user("mesero@demo.com", "secreto");
        let stale = manager.sign_in("mesero@demo.com", "secreto").await.unwrap();
        let live = manager.sign_in("mesero@demo.com", "secreto").await.unwrap();

        manager
            .sessions
            .get_mut(&stale.access_token)
            .unwrap()
            .expires_at = Utc::now() - Duration::hours(2);

        assert_eq!(manager.prune_expired(), 1);
        assert_eq!(manager.prune_expired(), 0);
        assert_eq!(manager.session_count(), 1);
        assert!(manager.resolve(&live.access_token).await.is_ok());
        assert_eq!(recorder.events.lock().iter().filter(|e| e.starts_with("out:")).count(), 1);
    }

    #[tokio::test]
    async fn test_cached_jwt_session_expires_with_token() {
        use jsonwebtoken::{EncodingKey, Header, encode};

        let secret = "super-secret-jwt-token-with-at-least-32-characters";
        let memory = MemoryBackend::new();
        let manager =
            SessionManager::new(Backend::in_process(&memory), Some(JwtValidator::new(secret)));
        let exp = (Utc::now() - Duration::seconds(59)).timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({"sub": "u1", "aud": "authenticated", "exp": exp}),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        // 仍在时钟容差内
        let session = manager.resolve(&token).await.unwrap();
        assert_eq!(session.expires_at.timestamp(), exp);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        let err = manager.resolve(&token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
        assert_eq!(manager.session_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let (_memory, manager, _) = manager();
        let err = manager.resolve("not-a-token").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }
}
