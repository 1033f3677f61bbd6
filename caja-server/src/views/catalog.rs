//! 菜单目录视图
//!
//! 点单台使用的菜单：全部分类 (按名称) 和可售菜品 (按名称)。
//! 菜品按分类过滤后交给购物车。

use serde::Serialize;
use shared::models::{Category, MenuItem, RecordId};

use crate::auth::SessionContext;
use crate::db::{CategoryRepository, MenuItemRepository};
use crate::utils::{AppResult, BackendResultExt, ErrorCode};

/// 菜单加载失败的提示
pub const MENU_LOAD_FAILED: &str = "Error cargando menú";

/// 已加载的菜单
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
}

impl Catalog {
    /// 加载分类和可售菜品；任一失败都整体失败
    pub async fn load(session: &SessionContext) -> AppResult<Self> {
        let data = &session.backend.data;
        let categories = CategoryRepository::new(data.clone())
            .find_all()
            .await
            .or_surface(ErrorCode::BackendError, MENU_LOAD_FAILED)?;
        let items = MenuItemRepository::new(data.clone())
            .find_available()
            .await
            .or_surface(ErrorCode::BackendError, MENU_LOAD_FAILED)?;

        tracing::debug!(
            categories = categories.len(),
            items = items.len(),
            "Menu loaded"
        );
        Ok(Self { categories, items })
    }

    /// 默认选中的分类 (第一个)
    pub fn default_category(&self) -> Option<&RecordId> {
        self.categories.first().map(|c| &c.id)
    }

    /// 某分类下的菜品；未选分类时为空
    pub fn filter(&self, category: Option<&RecordId>) -> Vec<MenuItem> {
        match category {
            Some(id) => self
                .items
                .iter()
                .filter(|item| item.in_category(id))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn find(&self, item_id: &RecordId) -> Option<&MenuItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::session;
    use caja_client::memory::{MemoryBackend, Operation};
    use serde_json::json;
    use shared::models::Collection;

    fn seed(memory: &MemoryBackend) {
        memory.seed(
            Collection::Categories,
            [
                json!({"id": 2, "nombre": "Postres"}),
                json!({"id": 1, "nombre": "Bebidas"}),
            ],
        );
        memory.seed(
            Collection::MenuItems,
            [
                json!({"id": 10, "nombre": "Limonada", "precio": 1.5, "categoria_id": 1}),
                json!({"id": 11, "nombre": "Flan", "precio": 2.0, "categoria_id": 2}),
                json!({"id": 12, "nombre": "Agua", "precio": 1.0, "categoria_id": 1}),
                json!({"id": 13, "nombre": "Café", "precio": 1.2, "categoria_id": 1, "disponible": false}),
            ],
        );
    }

    #[tokio::test]
    async fn test_load_orders_by_name_and_hides_unavailable() {
        let memory = MemoryBackend::new();
        seed(&memory);

        let catalog = Catalog::load(&session(&memory, "w1")).await.unwrap();
        let names: Vec<&str> = catalog.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bebidas", "Postres"]);
        assert_eq!(catalog.default_category(), Some(&RecordId::from(1)));

        let drinks: Vec<String> = catalog
            .filter(catalog.default_category())
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(drinks, vec!["Agua", "Limonada"]);
        assert!(catalog.filter(None).is_empty());
        assert!(catalog.find(&RecordId::from(13)).is_none());
    }

    #[tokio::test]
    async fn test_load_failure() {
        let memory = MemoryBackend::new();
        seed(&memory);
        memory.fail(Collection::MenuItems, Operation::Select, "permission denied for table platos");

        let err = Catalog::load(&session(&memory, "w1")).await.unwrap_err();
        assert_eq!(err.message, MENU_LOAD_FAILED);
        assert_eq!(err.description(), Some("permission denied for table platos"));
    }
}
