//! Repository Module
//!
//! Typed CRUD over the backend's collections. Every repository wraps a
//! [`DataClient`] acting for one session and decodes rows into the shared
//! record types.

pub mod category;
pub mod menu_item;
pub mod order;

// Re-exports
pub use category::CategoryRepository;
pub use menu_item::MenuItemRepository;
pub use order::OrderRepository;

use std::sync::Arc;

use caja_client::{ClientResult, DataClient};

/// Result type for repository operations
pub type RepoResult<T> = ClientResult<T>;

/// Base repository with data client reference
#[derive(Clone)]
pub struct BaseRepository {
    data: Arc<dyn DataClient>,
}

impl BaseRepository {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &dyn DataClient {
        self.data.as_ref()
    }
}
