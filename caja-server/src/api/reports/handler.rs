//! Reports API Handlers

use axum::extract::State;

use crate::auth::SessionContext;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};
use crate::views::DailySales;

/// GET /api/reports/daily - 营业时区今天的已付款销售
pub async fn daily(
    State(state): State<ServerState>,
    session: SessionContext,
) -> AppResult<ApiResponse<DailySales>> {
    let sales = DailySales::load(&session, state.config.business_timezone).await?;
    ok(sales)
}
