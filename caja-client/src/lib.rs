//! Caja Client - hosted backend collaborators
//!
//! Row access over REST ([`DataClient`]), email/password auth ([`AuthClient`])
//! and the websocket change feed ([`ChangeFeed`]). With the `in-process`
//! feature, [`memory::MemoryBackend`] implements all three in memory.

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod query;
pub mod realtime;

#[cfg(feature = "in-process")]
pub mod memory;

use std::sync::Arc;

pub use auth::{AuthClient, AuthSession, AuthUser, RestAuthClient};
pub use config::BackendConfig;
pub use data::{DataClient, RestDataClient, decode_row, decode_rows};
pub use error::{ClientError, ClientResult};
pub use query::Query;
pub use realtime::{ChangeFeed, RealtimeFeed, Subscription};

/// The three backend collaborators, shared behind trait objects
#[derive(Clone)]
pub struct Backend {
    pub data: Arc<dyn DataClient>,
    pub auth: Arc<dyn AuthClient>,
    pub feed: Arc<dyn ChangeFeed>,
}

impl Backend {
    /// Network clients for the hosted backend
    pub fn connect(config: &BackendConfig) -> ClientResult<Self> {
        Ok(Self {
            data: Arc::new(RestDataClient::new(config)?),
            auth: Arc::new(RestAuthClient::new(config)?),
            feed: Arc::new(RealtimeFeed::new(config)?),
        })
    }

    /// Every collaborator served by one in-process backend
    #[cfg(feature = "in-process")]
    pub fn in_process(backend: &memory::MemoryBackend) -> Self {
        Self {
            data: Arc::new(backend.clone()),
            auth: Arc::new(backend.clone()),
            feed: Arc::new(backend.clone()),
        }
    }

    /// Data and feed clients acting for the user holding `access_token`
    pub fn authorized(&self, access_token: &str) -> Self {
        Self {
            data: self.data.authorized(access_token),
            auth: self.auth.clone(),
            feed: self.feed.authorized(access_token),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
