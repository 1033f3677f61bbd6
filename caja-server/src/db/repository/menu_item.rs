//! Menu Item Repository

use std::sync::Arc;

use caja_client::{DataClient, Query, decode_row, decode_rows};
use shared::models::{Collection, MenuItem, MenuItemCreate, MenuItemUpdate, RecordId};

use super::{BaseRepository, RepoResult};

const COLLECTION: Collection = Collection::MenuItems;

#[derive(Clone)]
pub struct MenuItemRepository {
    base: BaseRepository,
}

impl MenuItemRepository {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self {
            base: BaseRepository::new(data),
        }
    }

    /// Find all items (available or not) ordered by name
    pub async fn find_all(&self) -> RepoResult<Vec<MenuItem>> {
        let query = Query::new().order_by("nombre", false);
        let rows = self.base.data().select(COLLECTION, &query).await?;
        decode_rows(COLLECTION, rows)
    }

    /// Find items offered to waiters (`disponible = true`) ordered by name
    pub async fn find_available(&self) -> RepoResult<Vec<MenuItem>> {
        let query = Query::new()
            .eq("disponible", true)
            .order_by("nombre", false);
        let rows = self.base.data().select(COLLECTION, &query).await?;
        decode_rows(COLLECTION, rows)
    }

    pub async fn create(&self, data: MenuItemCreate) -> RepoResult<MenuItem> {
        let row = serde_json::to_value(&data)?;
        let created = self.base.data().insert(COLLECTION, row).await?;
        decode_row(COLLECTION, created)
    }

    /// Patch the fields present in `data`
    pub async fn update(&self, id: &RecordId, data: MenuItemUpdate) -> RepoResult<MenuItem> {
        let patch = serde_json::to_value(&data)?;
        let updated = self.base.data().update(COLLECTION, id, patch).await?;
        decode_row(COLLECTION, updated)
    }

    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.base.data().delete(COLLECTION, id).await
    }
}
