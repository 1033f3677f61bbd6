//! Menu API Handlers

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use shared::models::{Category, MenuItem, RecordId};

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::utils::validation::non_blank;
use crate::utils::{ApiResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// 点单台菜单
#[derive(Debug, Serialize)]
pub struct MenuView {
    pub categories: Vec<Category>,
    /// 当前选中的分类 (未指定时为第一个分类)
    pub selected: Option<RecordId>,
    pub items: Vec<MenuItem>,
}

/// GET /api/menu?category= - 重新加载菜单，返回所选分类下的可售菜品
pub async fn get_menu(
    State(state): State<ServerState>,
    session: SessionContext,
    Query(query): Query<MenuQuery>,
) -> AppResult<ApiResponse<MenuView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    let catalog = desk.reload_catalog(&session).await?;

    let selected = non_blank(query.category.as_deref())
        .map(RecordId::new)
        .or_else(|| catalog.default_category().cloned());
    let items = catalog.filter(selected.as_ref());

    ok(MenuView {
        categories: catalog.categories.clone(),
        selected,
        items,
    })
}
