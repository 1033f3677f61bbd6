//! Caja Server - 餐厅点单与收银服务
//!
//! # 架构概述
//!
//! 服务员点单、收银、库存和日报四个界面背后的 HTTP 服务。
//! 数据、认证和实时变更都来自托管后端 (`caja-client`)，
//! 本服务持有每个服务员的购物车和收银的未付款订单集合。
//!
//! # 模块结构
//!
//! ```text
//! caja-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # 会话、JWT、认证中间件
//! ├── db/            # 后端表的仓储
//! ├── views/         # 点单台、收银、报表、库存
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 路由组装和中间件栈
//! ├── middleware/    # 请求日志
//! └── utils/         # 错误、日志、时区、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod middleware;
pub mod routes;
pub mod utils;
pub mod views;

// Re-export 公共类型
pub use auth::{SessionContext, SessionListener, SessionManager};
pub use core::{Config, Server, ServerState};
pub use routes::build_app;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   ______
  / ____/___ _    (_)___ _
 / /   / __ `/   / / __ `/
/ /___/ /_/ /   / / /_/ /
\____/\__,_/ __/ /\__,_/
            /___/
    "#
    );
}
