use thiserror::Error;

/// 服务器启动/运行错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("后端连接失败: {0}")]
    Backend(#[from] caja_client::ClientError),

    #[error("端口绑定失败: {0}")]
    Bind(#[source] std::io::Error),

    #[error("HTTP 服务错误: {0}")]
    Serve(#[source] std::io::Error),
}

/// 服务器 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
