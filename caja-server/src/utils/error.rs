//! 统一错误处理
//!
//! 错误类型来自 `shared::error`；本模块负责把后端客户端错误
//! ([`ClientError`]) 转换成面向界面的 [`AppError`]：
//!
//! - `message` 是界面标题 (如 "No se pudo enviar el pedido")
//! - `details.description` 是后端原始错误信息
//!
//! # 使用示例
//!
//! ```ignore
//! repo.insert(order)
//!     .await
//!     .or_surface(ErrorCode::OrderSubmitFailed, "No se pudo enviar el pedido")?;
//! ```

use caja_client::ClientError;
use shared::models::AmountOverflow;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// 把后端错误映射为带标题的应用错误
///
/// 网络层失败 (连接失败/超时) 和会话失效使用各自的错误码，
/// 其他失败使用调用方给定的 `code`。
pub fn surface(err: ClientError, code: ErrorCode, headline: &str) -> AppError {
    let code = match &err {
        ClientError::Unauthorized => ErrorCode::SessionExpired,
        ClientError::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
        ClientError::Http(e) if e.is_connect() => ErrorCode::NetworkError,
        _ => code,
    };
    let description = err.backend_message();
    tracing::warn!(code = %code, headline = %headline, error = %description, "Backend operation failed");
    AppError::with_message(code, headline).with_description(description)
}

pub const AMOUNT_OUT_OF_RANGE: &str = "Importe fuera de rango";

/// 金额溢出 (价格 × 数量或求和超出 `Decimal` 范围)
pub fn amount_out_of_range(_: AmountOverflow) -> AppError {
    AppError::with_message(ErrorCode::AmountOutOfRange, AMOUNT_OUT_OF_RANGE)
}

/// `Result<T, ClientError>` 扩展
pub trait BackendResultExt<T> {
    /// 失败时以 `headline` 作为界面标题返回
    fn or_surface(self, code: ErrorCode, headline: &str) -> AppResult<T>;
}

impl<T> BackendResultExt<T> for Result<T, ClientError> {
    fn or_surface(self, code: ErrorCode, headline: &str) -> AppResult<T> {
        self.map_err(|e| surface(e, code, headline))
    }
}

/// 成功响应
pub fn ok<T>(data: T) -> AppResult<ApiResponse<T>> {
    Ok(ApiResponse::success(data))
}

/// 带消息的成功响应
pub fn ok_with_message<T>(message: impl Into<String>, data: T) -> AppResult<ApiResponse<T>> {
    Ok(ApiResponse::success_with_message(message, data))
}
