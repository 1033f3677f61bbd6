use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// `details` 中保存后端原文的键，界面显示在标题下方
pub const DESCRIPTION_DETAIL: &str = "description";

pub type Details = HashMap<String, Value>;

/// 界面可直接显示的错误
///
/// `message` 是标题 (例如 "No se pudo enviar el pedido")，
/// `details` 放字段名或后端原始报错。
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Details>,
}

impl AppError {
    /// 使用错误码的默认文案
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Details::new)
            .insert(key.into(), value.into());
        self
    }

    /// 附上后端原文
    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_detail(DESCRIPTION_DETAIL, description.into())
    }

    pub fn description(&self) -> Option<&str> {
        self.details.as_ref()?.get(DESCRIPTION_DETAIL)?.as_str()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, message)
    }

    /// `"<resource> not found"`，并在 details 中记录资源名
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, message)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::BackendError, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, message)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// 所有接口共用的响应信封
///
/// 成功时 `code` 为 0 并带 `data`；失败时带错误码、标题和 `details`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    /// 成功并给界面一条提示 (例如 "Pedido enviado")
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }

    /// 信封对应的 HTTP 状态，未知错误码按 500 处理
    fn status(&self) -> StatusCode {
        match self.code {
            None | Some(0) => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        err.clone().into()
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category().is_system() {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                description = ?self.description(),
                "System error"
            );
        }
        ApiResponse::<()>::from(self).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (self.status(), axum::Json(self)).into_response()
    }
}
