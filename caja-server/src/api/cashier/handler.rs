//! Cashier API Handlers

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};
use serde::Serialize;
use shared::models::{Order, RecordId};
use tokio::sync::broadcast::error::RecvError;

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};
use crate::views::PendingOrders;
use crate::views::cashier::{PAID, PAID_DETAIL};

/// SSE 事件名
const ORDERS_EVENT: &str = "orders";

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub order: Order,
    pub detail: &'static str,
}

/// GET /api/cashier/orders
pub async fn list_orders(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<ApiResponse<PendingOrders>> {
    let pending = state.cashier.current(&session).await?;
    ok(pending)
}

/// POST /api/cashier/orders/{id}/pay
pub async fn pay(
    State(state): State<ServerState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PayResponse>> {
    let order = state
        .cashier
        .mark_paid(&session, &RecordId::new(id))
        .await?;
    ok_with_message(
        PAID,
        PayResponse {
            order,
            detail: PAID_DETAIL,
        },
    )
}

/// GET /api/cashier/stream
///
/// 先推送当前列表，之后每次变化推送完整列表。
/// 推送落后时跳过中间版本，只发最新的。
pub async fn stream(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    // 先订阅再读取，避免漏掉两者之间的变化
    let updates = state.cashier.updates();
    let initial = state.cashier.current(&session).await?;

    tracing::debug!(user_id = %session.user_id(), orders = initial.orders.len(), "Cashier stream opened");

    let first = stream::once(async move { orders_event(&initial.orders) });
    let rest = stream::unfold(updates, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(orders) => return Some((orders_event(&orders), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cashier stream lagging");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(first.chain(rest)).keep_alive(KeepAlive::default()))
}

fn orders_event(orders: &[Order]) -> Result<Event, axum::Error> {
    Event::default().event(ORDERS_EVENT).json_data(orders)
}
