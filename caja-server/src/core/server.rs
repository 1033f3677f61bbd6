//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::time::Duration;

use tokio::net::TcpListener;

use crate::core::{Config, Result, ServerError, ServerState};
use crate::routes::build_app;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
        tracing::info!("🧾 Caja Server starting on {}", addr);

        let sweeper = spawn_session_sweeper(&state);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let app = build_app(&state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)?;

        sweeper.abort();
        state.shutdown();
        Ok(())
    }
}

/// 定期清理过期会话 (长时间不再使用的令牌不会在命中时被清理)
fn spawn_session_sweeper(state: &ServerState) -> tokio::task::JoinHandle<()> {
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.prune_expired();
            if removed > 0 {
                tracing::info!(removed, remaining = sessions.session_count(), "Expired sessions pruned");
            }
        }
    })
}
