//! 库存管理
//!
//! 分类和菜品的增删改。列表按名称排序，搜索和分类过滤在本地完成。

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{
    Category, CategoryCreate, MenuItem, MenuItemCreate, MenuItemUpdate, RecordId,
};
use std::str::FromStr;

use crate::auth::SessionContext;
use crate::db::{CategoryRepository, MenuItemRepository};
use crate::utils::validation::non_blank;
use crate::utils::{AppError, AppResult, BackendResultExt, ErrorCode};

pub const INVENTORY_LOAD_FAILED: &str = "Error cargando inventario";
pub const NAME_REQUIRED: &str = "Nombre requerido";
pub const CATEGORY_CREATE_FAILED: &str = "Error creando categoría";
pub const CATEGORY_CREATED: &str = "Categoría creada";
pub const CATEGORY_DELETED: &str = "Categoría eliminada";
pub const ITEM_FIELDS_REQUIRED: &str = "Completa nombre, precio y categoría";
pub const INVALID_PRICE: &str = "Precio inválido";
pub const ITEM_CREATE_FAILED: &str = "Error creando plato";
pub const ITEM_CREATED: &str = "Producto creado";
pub const ITEM_UPDATE_FAILED: &str = "Error actualizando";
pub const ITEM_DELETED: &str = "Producto eliminado";
pub const DELETE_FAILED: &str = "No se pudo eliminar";

/// 菜品列表过滤条件；空白输入不过滤，两者同时给出时取交集
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub category: Option<RecordId>,
}

impl InventoryFilter {
    pub fn apply(&self, items: Vec<MenuItem>) -> Vec<MenuItem> {
        let needle = non_blank(self.search.as_deref()).map(str::to_lowercase);
        items
            .into_iter()
            .filter(|item| needle.as_deref().is_none_or(|n| item.matches_search(n)))
            .filter(|item| self.category.as_ref().is_none_or(|c| item.in_category(c)))
            .collect()
    }
}

/// 库存页面数据
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
}

/// 新建菜品的表单输入；价格以文本提交
#[derive(Debug, Clone, Default)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category_id: Option<RecordId>,
    pub available: bool,
}

impl NewMenuItem {
    /// 校验并转换为写入载荷
    pub fn into_create(self) -> AppResult<MenuItemCreate> {
        let name = self.name.trim();
        let price = self.price.trim();
        let category_id = match self.category_id {
            Some(id) if !name.is_empty() && !price.is_empty() => id,
            _ => {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    ITEM_FIELDS_REQUIRED,
                ));
            }
        };
        let price = parse_price(price)?;

        Ok(MenuItemCreate {
            name: name.to_string(),
            description: self.description,
            price,
            category_id,
            available: self.available,
        })
    }
}

/// 价格文本转为十进制数；不做范围校验
pub fn parse_price(raw: &str) -> AppResult<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| {
            AppError::with_message(ErrorCode::MenuItemInvalidPrice, INVALID_PRICE)
                .with_detail("price", raw)
        })
}

/// 加载分类和全部菜品 (含不可售)，按名称排序后过滤
pub async fn list(session: &SessionContext, filter: &InventoryFilter) -> AppResult<Inventory> {
    let data = &session.backend.data;
    let categories = CategoryRepository::new(data.clone())
        .find_all()
        .await
        .or_surface(ErrorCode::BackendError, INVENTORY_LOAD_FAILED)?;
    let items = MenuItemRepository::new(data.clone())
        .find_all()
        .await
        .or_surface(ErrorCode::BackendError, INVENTORY_LOAD_FAILED)?;

    Ok(Inventory {
        categories,
        items: filter.apply(items),
    })
}

/// 分类列表 (按名称)
pub async fn list_categories(session: &SessionContext) -> AppResult<Vec<Category>> {
    CategoryRepository::new(session.backend.data.clone())
        .find_all()
        .await
        .or_surface(ErrorCode::BackendError, INVENTORY_LOAD_FAILED)
}

/// 新建分类；名称去除首尾空白后不能为空
pub async fn create_category(
    session: &SessionContext,
    name: &str,
    icon: Option<&str>,
) -> AppResult<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, NAME_REQUIRED));
    }

    let mut data = CategoryCreate::new(name);
    if let Some(icon) = icon {
        data = data.with_icon(icon);
    }

    let category = CategoryRepository::new(session.backend.data.clone())
        .create(data)
        .await
        .or_surface(ErrorCode::BackendError, CATEGORY_CREATE_FAILED)?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok(category)
}

/// 删除分类；引用它的菜品不做处理
pub async fn delete_category(session: &SessionContext, id: &RecordId) -> AppResult<()> {
    CategoryRepository::new(session.backend.data.clone())
        .delete(id)
        .await
        .or_surface(ErrorCode::BackendError, DELETE_FAILED)?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(())
}

pub async fn create_item(session: &SessionContext, input: NewMenuItem) -> AppResult<MenuItem> {
    let data = input.into_create()?;
    let item = MenuItemRepository::new(session.backend.data.clone())
        .create(data)
        .await
        .or_surface(ErrorCode::BackendError, ITEM_CREATE_FAILED)?;
    tracing::info!(item_id = %item.id, name = %item.name, price = %item.price, "Menu item created");
    Ok(item)
}

/// 部分更新，立即写入
pub async fn update_item(
    session: &SessionContext,
    id: &RecordId,
    patch: MenuItemUpdate,
) -> AppResult<MenuItem> {
    if patch.is_empty() {
        return Err(AppError::validation("Nothing to update"));
    }
    let item = MenuItemRepository::new(session.backend.data.clone())
        .update(id, patch)
        .await
        .or_surface(ErrorCode::BackendError, ITEM_UPDATE_FAILED)?;
    tracing::info!(item_id = %item.id, "Menu item updated");
    Ok(item)
}

pub async fn delete_item(session: &SessionContext, id: &RecordId) -> AppResult<()> {
    MenuItemRepository::new(session.backend.data.clone())
        .delete(id)
        .await
        .or_surface(ErrorCode::BackendError, DELETE_FAILED)?;
    tracing::info!(item_id = %id, "Menu item deleted");
    Ok(())
}
