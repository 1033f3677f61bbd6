//! 错误与响应信封
//!
//! 服务端和任何 API 调用方共用：
//! - [`ErrorCode`] 数字错误码 (含 HTTP 状态映射)
//! - [`ErrorCategory`] 按千位分段的领域
//! - [`AppError`] 界面显示的标题 + 可选细节
//! - [`ApiResponse`] 统一的 `{code, message, data, details}` 信封
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::PaymentFailed, "No se pudo procesar pago")
//!     .with_description("permission denied for table pedidos");
//! assert_eq!(err.description(), Some("permission denied for table pedidos"));
//!
//! let body = ApiResponse::<()>::error(&err);
//! assert_eq!(body.code, Some(5001));
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult, DESCRIPTION_DETAIL};
