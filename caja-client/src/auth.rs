//! Authentication collaborator
//!
//! Email/password sign-in, sign-out and token-to-user lookup against the
//! backend's auth service.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{BackendConfig, ClientError, ClientResult};

/// Authenticated user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued on sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange email and password for a session
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession>;

    /// Revoke the session holding `access_token`
    async fn sign_out(&self, access_token: &str) -> ClientResult<()>;

    /// Resolve `access_token` to its user; [`ClientError::Unauthorized`] when invalid
    async fn user(&self, access_token: &str) -> ClientResult<AuthUser>;
}

/// REST auth client
#[derive(Debug, Clone)]
pub struct RestAuthClient {
    client: Client,
    config: BackendConfig,
}

impl RestAuthClient {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_response(status.as_u16(), &text));
        }
        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl AuthClient for RestAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        #[derive(Serialize)]
        struct PasswordGrant<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .client
            .post(self.config.auth_url("token?grant_type=password"))
            .header("apikey", &self.config.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;
        let session: AuthSession = Self::handle_response(response).await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_response(status.as_u16(), &text));
        }
        Ok(())
    }

    async fn user(&self, access_token: &str) -> ClientResult<AuthUser> {
        let response = self
            .client
            .get(self.config.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
