use caja_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env (不存在时忽略)
    let _ = dotenv::dotenv();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 日志 (生产环境输出 JSON)
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );

    print_banner();
    tracing::info!(environment = %config.environment, "🧾 Caja Server starting...");

    // 4. 初始化服务器状态
    let state = ServerState::initialize(&config)?;

    // 5. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
