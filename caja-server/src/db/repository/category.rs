//! Category Repository

use std::sync::Arc;

use caja_client::{DataClient, Query, decode_row, decode_rows};
use serde_json::Value;
use shared::models::{Category, CategoryCreate, Collection, RecordId};

use super::{BaseRepository, RepoResult};

const COLLECTION: Collection = Collection::Categories;

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self {
            base: BaseRepository::new(data),
        }
    }

    /// Find all categories ordered by name
    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let query = Query::new().order_by("nombre", false);
        let rows = self.base.data().select(COLLECTION, &query).await?;
        decode_rows(COLLECTION, rows)
    }

    /// Create a new category
    pub async fn create(&self, data: CategoryCreate) -> RepoResult<Category> {
        let row = serde_json::to_value(&data)?;
        let created: Value = self.base.data().insert(COLLECTION, row).await?;
        decode_row(COLLECTION, created)
    }

    /// Hard delete a category; items referencing it keep the dangling id
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.base.data().delete(COLLECTION, id).await
    }
}
