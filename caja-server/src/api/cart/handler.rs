//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{Order, RecordId, ServiceType};

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::utils::validation::{MAX_NOTE_LEN, validate_max_len};
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};
use crate::views::DeskView;
use crate::views::intake::{SUBMITTED, SUBMITTED_DETAIL};

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: RecordId,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: String,
}

/// `null` 清除选择
#[derive(Debug, Deserialize)]
pub struct ServiceTypeRequest {
    pub service_type: Option<ServiceType>,
}

/// 提交结果
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub order: Order,
    pub detail: &'static str,
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let view = desk.lock().await.view()?;
    ok(view)
}

/// POST /api/cart/items - 加入菜品 (同一菜品且无备注时合并)
pub async fn add_item(
    State(state): State<ServerState>,
    session: SessionContext,
    Json(req): Json<AddItemRequest>,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.add_item(&session, &req.item_id).await?;
    ok(desk.view()?)
}

pub async fn increment(
    State(state): State<ServerState>,
    session: SessionContext,
    Path(index): Path<usize>,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.increment(index)?;
    ok(desk.view()?)
}

/// 数量减到 0 时移除该行
pub async fn decrement(
    State(state): State<ServerState>,
    session: SessionContext,
    Path(index): Path<usize>,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.decrement(index)?;
    ok(desk.view()?)
}

pub async fn set_note(
    State(state): State<ServerState>,
    session: SessionContext,
    Path(index): Path<usize>,
    Json(req): Json<NoteRequest>,
) -> AppResult<ApiResponse<DeskView>> {
    validate_max_len(&req.note, "note", MAX_NOTE_LEN)?;

    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.set_note(index, req.note)?;
    ok(desk.view()?)
}

pub async fn remove_line(
    State(state): State<ServerState>,
    session: SessionContext,
    Path(index): Path<usize>,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.remove(index)?;
    ok(desk.view()?)
}

pub async fn set_service_type(
    State(state): State<ServerState>,
    session: SessionContext,
    Json(req): Json<ServiceTypeRequest>,
) -> AppResult<ApiResponse<DeskView>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    desk.set_service_type(req.service_type);
    ok(desk.view()?)
}

/// POST /api/cart/submit - 提交订单到收银
///
/// 点单台的锁持有到写入完成，同一购物车的并发提交会依次执行，
/// 第二次提交看到的是已清空的购物车。
pub async fn submit(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<ApiResponse<SubmitResponse>> {
    let desk = state.desks.desk(session.user_id());
    let mut desk = desk.lock().await;
    let order = desk.submit(&session).await?;
    ok_with_message(
        SUBMITTED,
        SubmitResponse {
            order,
            detail: SUBMITTED_DETAIL,
        },
    )
}
