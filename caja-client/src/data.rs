//! Remote data client
//!
//! [`DataClient`] is the row-level contract the application needs from the
//! backend: select, insert, update-by-id and delete-by-id over one
//! collection. [`RestDataClient`] speaks the backend's REST dialect.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::models::{Collection, RecordId};
use std::sync::Arc;
use std::time::Duration;

use crate::query::Query;
use crate::{BackendConfig, ClientError, ClientResult};

/// Row-level access to the backend's collections
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Rows of `collection` matching `query`, in the query's order
    async fn select(&self, collection: Collection, query: &Query) -> ClientResult<Vec<Value>>;

    /// Insert one row and return it as stored (with generated columns)
    async fn insert(&self, collection: Collection, row: Value) -> ClientResult<Value>;

    /// Patch the row with `id` and return it as stored
    async fn update(&self, collection: Collection, id: &RecordId, patch: Value)
    -> ClientResult<Value>;

    /// Delete the row with `id`
    async fn delete(&self, collection: Collection, id: &RecordId) -> ClientResult<()>;

    /// A client acting on behalf of the signed-in user holding `access_token`
    fn authorized(&self, access_token: &str) -> Arc<dyn DataClient>;
}

/// Decode raw rows into a fixed record shape
///
/// Any row that does not fit fails the whole read with [`ClientError::Decode`].
pub fn decode_rows<T: DeserializeOwned>(
    collection: Collection,
    rows: Vec<Value>,
) -> ClientResult<Vec<T>> {
    rows.into_iter().map(|row| decode_row(collection, row)).collect()
}

/// Decode one raw row
pub fn decode_row<T: DeserializeOwned>(collection: Collection, row: Value) -> ClientResult<T> {
    serde_json::from_value(row).map_err(|e| ClientError::Decode {
        collection,
        message: e.to_string(),
    })
}

/// REST data client
#[derive(Debug, Clone)]
pub struct RestDataClient {
    client: Client,
    config: BackendConfig,
    access_token: Option<String>,
}

impl RestDataClient {
    /// Create a new client from configuration
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            access_token: None,
        })
    }

    /// Set the user's access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Attach key, bearer and schema headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.config.anon_key);
        request
            .header("apikey", &self.config.anon_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", bearer))
            .header("Accept-Profile", &self.config.schema)
            .header("Content-Profile", &self.config.schema)
    }

    fn id_filter(id: &RecordId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id.as_str()))]
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_response(status.as_u16(), &text));
        }

        response.json().await.map_err(Into::into)
    }

    /// First row of a `return=representation` write
    fn single(collection: Collection, rows: Vec<Value>) -> ClientResult<Value> {
        rows.into_iter().next().ok_or_else(|| ClientError::Decode {
            collection,
            message: "write returned no rows".to_string(),
        })
    }
}

#[async_trait]
impl DataClient for RestDataClient {
    async fn select(&self, collection: Collection, query: &Query) -> ClientResult<Vec<Value>> {
        let request = self
            .client
            .get(self.config.rest_url(collection.table()))
            .query(&query.to_params());
        let response = self.authorize(request).send().await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        tracing::debug!(collection = %collection, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Value) -> ClientResult<Value> {
        let request = self
            .client
            .post(self.config.rest_url(collection.table()))
            .header("Prefer", "return=representation")
            .json(&row);
        let response = self.authorize(request).send().await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        Self::single(collection, rows)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Value,
    ) -> ClientResult<Value> {
        let request = self
            .client
            .patch(self.config.rest_url(collection.table()))
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.authorize(request).send().await?;
        let rows: Vec<Value> = Self::handle_response(response).await?;
        rows.into_iter().next().ok_or_else(|| ClientError::NotFound {
            collection,
            id: id.clone(),
        })
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> ClientResult<()> {
        let request = self
            .client
            .delete(self.config.rest_url(collection.table()))
            .query(&Self::id_filter(id));
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ClientError::from_response(status.as_u16(), &text));
        }
        Ok(())
    }

    fn authorized(&self, access_token: &str) -> Arc<dyn DataClient> {
        Arc::new(self.clone().with_token(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[allow(dead_code)]
        id: i64,
        nombre: String,
    }

    #[test]
    fn test_decode_rows_names_collection_on_failure() {
        let rows = vec![json!({"id": 1, "nombre": "Bebidas"}), json!({"id": 2})];
        let err = decode_rows::<Row>(Collection::Categories, rows).unwrap_err();
        match err {
            ClientError::Decode { collection, message } => {
                assert_eq!(collection, Collection::Categories);
                assert!(message.contains("nombre"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rows() {
        let rows = vec![json!({"id": 1, "nombre": "Bebidas"})];
        let decoded = decode_rows::<Row>(Collection::Categories, rows).unwrap();
        assert_eq!(decoded[0].nombre, "Bebidas");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = BackendConfig::new("ftp://nowhere", "key");
        assert!(matches!(RestDataClient::new(&config), Err(ClientError::Config(_))));
    }
}
