use std::sync::Arc;

use caja_client::Backend;

use crate::auth::{JwtValidator, SessionManager};
use crate::core::{Config, Result};
use crate::views::{CashierMonitor, Desks};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆一份。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | backend | Backend | 后端客户端 (匿名身份) |
/// | sessions | Arc<SessionManager> | 登录会话 |
/// | desks | Arc<Desks> | 每个服务员的点单台 |
/// | cashier | Arc<CashierMonitor> | 未付款订单监控 |
///
/// 点单台和收银监控注册为会话监听器，随登录/登出启动和释放。
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 后端客户端
    pub backend: Backend,
    /// 会话管理器
    pub sessions: Arc<SessionManager>,
    /// 点单台
    pub desks: Arc<Desks>,
    /// 收银监控
    pub cashier: Arc<CashierMonitor>,
}

impl ServerState {
    /// 用已有的后端客户端创建状态 (测试使用内存后端)
    pub fn new(config: Config, backend: Backend) -> Self {
        let jwt = config.backend_jwt_secret.as_deref().map(JwtValidator::new);
        let sessions = Arc::new(SessionManager::new(backend.clone(), jwt));
        let desks = Arc::new(Desks::new());
        let cashier = Arc::new(CashierMonitor::new(config.realtime_enabled));

        sessions.add_listener(desks.clone());
        sessions.add_listener(cashier.clone());

        Self {
            config,
            backend,
            sessions,
            desks,
            cashier,
        }
    }

    /// 按配置连接后端并创建状态
    pub fn initialize(config: &Config) -> Result<Self> {
        let backend = Backend::connect(&config.backend())?;
        tracing::info!(
            backend_url = %config.backend_url,
            local_jwt = config.backend_jwt_secret.is_some(),
            realtime = config.realtime_enabled,
            "Backend clients ready"
        );
        Ok(Self::new(config.clone(), backend))
    }

    /// 停止后台任务
    pub fn shutdown(&self) {
        self.cashier.stop();
    }
}
