//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, Query},
};
use serde::Deserialize;
use serde_json::Value;
use shared::models::{Category, MenuItem, MenuItemUpdate, RecordId};
use validator::Validate;

use crate::auth::SessionContext;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, non_blank, validate_body, validate_max_len,
    validate_optional_text,
};
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};
use crate::views::inventory::{
    self, CATEGORY_CREATED, CATEGORY_DELETED, ITEM_CREATED, ITEM_DELETED,
};
use crate::views::{Inventory, InventoryFilter, NewMenuItem};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[serde(rename = "nombre", default)]
    #[validate(length(max = 200, message = "Nombre demasiado largo"))]
    pub name: String,
    #[serde(rename = "icono", default)]
    #[validate(length(max = 100, message = "Icono demasiado largo"))]
    pub icon: Option<String>,
}

/// 新建菜品；`precio` 可以是数字或文本
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[serde(rename = "nombre", default)]
    #[validate(length(max = 200, message = "Nombre demasiado largo"))]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    #[validate(length(max = 500, message = "Descripción demasiado larga"))]
    pub description: String,
    #[serde(rename = "precio", default)]
    pub price: Value,
    #[serde(rename = "categoria_id", default)]
    pub category_id: Option<RecordId>,
    #[serde(rename = "disponible", default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl CreateItemRequest {
    fn into_input(self) -> NewMenuItem {
        let price = match self.price {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        NewMenuItem {
            name: self.name,
            description: self.description,
            price,
            category_id: self.category_id,
            available: self.available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// GET /api/inventory/categories
pub async fn list_categories(session: SessionContext) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = inventory::list_categories(&session).await?;
    ok(categories)
}

/// POST /api/inventory/categories
pub async fn create_category(
    session: SessionContext,
    Json(req): Json<CreateCategoryRequest>,
) -> AppResult<ApiResponse<Category>> {
    validate_body(&req)?;
    let category = inventory::create_category(&session, &req.name, req.icon.as_deref()).await?;
    ok_with_message(CATEGORY_CREATED, category)
}

/// DELETE /api/inventory/categories/{id} - 引用它的菜品不受影响
pub async fn delete_category(
    session: SessionContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    inventory::delete_category(&session, &RecordId::new(id)).await?;
    ok_with_message(CATEGORY_DELETED, ())
}

/// GET /api/inventory/items?search=&category=
pub async fn list_items(
    session: SessionContext,
    Query(query): Query<ItemsQuery>,
) -> AppResult<ApiResponse<Inventory>> {
    let filter = InventoryFilter {
        search: query.search,
        category: non_blank(query.category.as_deref()).map(RecordId::new),
    };
    let inventory = inventory::list(&session, &filter).await?;
    ok(inventory)
}

/// POST /api/inventory/items
pub async fn create_item(
    session: SessionContext,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<ApiResponse<MenuItem>> {
    validate_body(&req)?;
    let item = inventory::create_item(&session, req.into_input()).await?;
    ok_with_message(ITEM_CREATED, item)
}

/// PATCH /api/inventory/items/{id} - 部分更新 (如切换 `disponible`)
pub async fn update_item(
    session: SessionContext,
    Path(id): Path<String>,
    Json(patch): Json<MenuItemUpdate>,
) -> AppResult<ApiResponse<MenuItem>> {
    if let Some(name) = &patch.name {
        validate_max_len(name, "nombre", MAX_NAME_LEN)?;
    }
    validate_optional_text(&patch.description, "descripcion", MAX_NOTE_LEN)?;

    let item = inventory::update_item(&session, &RecordId::new(id), patch).await?;
    ok(item)
}

/// DELETE /api/inventory/items/{id}
pub async fn delete_item(
    session: SessionContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    inventory::delete_item(&session, &RecordId::new(id)).await?;
    ok_with_message(ITEM_DELETED, ())
}
