//! Backend configuration

use crate::{ClientError, ClientResult};

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL (e.g., "https://xyzcompany.supabase.co")
    pub url: String,

    /// Public (anon) API key, sent as `apikey` on every request
    pub anon_key: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Database schema the tables live in
    pub schema: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: 30,
            schema: "public".to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Reject configurations that cannot possibly reach a backend
    pub fn validate(&self) -> ClientResult<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "backend url must be http(s): {:?}",
                self.url
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ClientError::Config("anon key is empty".to_string()));
        }
        Ok(())
    }

    /// `{url}/rest/v1/{table}`
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// `{url}/auth/v1/{path}`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    /// Websocket endpoint of the realtime service
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.anon_key
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let config = BackendConfig::new("https://demo.supabase.co/", "anon");
        assert_eq!(config.rest_url("platos"), "https://demo.supabase.co/rest/v1/platos");
        assert_eq!(
            config.auth_url("token?grant_type=password"),
            "https://demo.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            config.realtime_url(),
            "wss://demo.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_key() {
        assert!(BackendConfig::default().validate().is_err());
        assert!(BackendConfig::new("demo.supabase.co", "k").validate().is_err());
    }
}
