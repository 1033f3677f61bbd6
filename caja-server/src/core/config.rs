use caja_client::BackendConfig;
use chrono_tz::Tz;

/// 服务器配置 - 收银服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (启动时先加载 `.env`)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | BACKEND_URL | http://localhost:54321 | 托管后端地址 |
/// | BACKEND_ANON_KEY | (空) | 后端公开 API key |
/// | BACKEND_JWT_SECRET | (无) | 设置后本地校验访问令牌 (HS256) |
/// | BACKEND_TIMEOUT_SECS | 30 | 后端请求超时(秒) |
/// | BUSINESS_TIMEZONE | (系统时区) | 营业时区 (IANA 名称，如 America/Mexico_City) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | REALTIME_ENABLED | true | 是否订阅订单实时变更 |
///
/// # 示例
///
/// ```ignore
/// BACKEND_URL=https://demo.supabase.co BACKEND_ANON_KEY=... HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 托管后端地址
    pub backend_url: String,
    /// 后端公开 API key
    pub backend_anon_key: String,
    /// 后端 JWT 密钥 (可选)
    pub backend_jwt_secret: Option<String>,
    /// 后端请求超时 (秒)
    pub backend_timeout_secs: u64,
    /// 营业时区，`None` 表示使用系统时区
    pub business_timezone: Option<Tz>,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// 是否启用实时订阅
    pub realtime_enabled: bool,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:54321".into()),
            backend_anon_key: std::env::var("BACKEND_ANON_KEY").unwrap_or_default(),
            backend_jwt_secret: std::env::var("BACKEND_JWT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            backend_timeout_secs: std::env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            business_timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|name| parse_timezone(&name)),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.trim().is_empty()),
            realtime_enabled: std::env::var("REALTIME_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }

    /// 测试用配置 (不读取环境变量)
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            environment: "test".into(),
            backend_url: "http://localhost:54321".into(),
            backend_anon_key: "test-anon-key".into(),
            backend_jwt_secret: None,
            backend_timeout_secs: 5,
            business_timezone: None,
            log_level: "debug".into(),
            log_dir: None,
            realtime_enabled: true,
        }
    }

    /// 客户端侧的后端配置
    pub fn backend(&self) -> BackendConfig {
        BackendConfig::new(&self.backend_url, &self.backend_anon_key)
            .with_timeout(self.backend_timeout_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 解析 IANA 时区名，失败时记录警告并回退到系统时区
fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(e) => {
            tracing::warn!("Invalid BUSINESS_TIMEZONE '{}': {}, using system local time", name, e);
            None
        }
    }
}
