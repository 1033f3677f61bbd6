//! 错误码表
//!
//! 每个错误码在下面的 `error_codes!` 表里登记一次：数值、HTTP 状态和默认文案。
//! 数值按千位分段，见 [`ErrorCategory`](super::ErrorCategory)。

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! error_codes {
    ($( $(#[$meta:meta])* $name:ident = $value:literal => $status:ident, $message:literal; )*) => {
        /// API 返回给界面的数字错误码
        ///
        /// 序列化为 `u16`，前端按数值分支，不做字符串匹配。
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u16", try_from = "u16")]
        #[repr(u16)]
        pub enum ErrorCode {
            $( $(#[$meta])* $name = $value, )*
        }

        impl ErrorCode {
            /// 默认文案 (英文，界面通常用 `AppError::with_message` 覆盖)
            pub const fn message(&self) -> &'static str {
                match self {
                    $( Self::$name => $message, )*
                }
            }

            /// 对应的 HTTP 状态
            pub fn http_status(&self) -> StatusCode {
                match self {
                    $( Self::$name => StatusCode::$status, )*
                }
            }
        }

        impl TryFrom<u16> for ErrorCode {
            type Error = InvalidErrorCode;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Self::$name), )*
                    other => Err(InvalidErrorCode(other)),
                }
            }
        }
    };
}

error_codes! {
    // 0xxx 通用
    Success = 0 => OK, "OK";
    ValidationFailed = 2 => BAD_REQUEST, "Validation failed";
    NotFound = 3 => NOT_FOUND, "Resource not found";
    InvalidRequest = 5 => BAD_REQUEST, "Invalid request";
    RequiredField = 7 => BAD_REQUEST, "Required field is missing";

    // 1xxx 登录与令牌
    NotAuthenticated = 1001 => UNAUTHORIZED, "User is not authenticated";
    InvalidCredentials = 1002 => UNAUTHORIZED, "Invalid email or password";
    TokenExpired = 1003 => UNAUTHORIZED, "Authentication token has expired";
    TokenInvalid = 1004 => UNAUTHORIZED, "Authentication token is invalid";
    /// 令牌有效但服务端已没有对应会话 (已登出)
    SessionExpired = 1005 => UNAUTHORIZED, "Session has expired";

    // 4xxx 点单
    OrderEmpty = 4007 => BAD_REQUEST, "Cart is empty";
    ServiceTypeRequired = 4008 => BAD_REQUEST, "Service type is required";
    /// 后端拒绝插入订单
    OrderSubmitFailed = 4009 => BAD_GATEWAY, "Order could not be submitted";
    CartLineNotFound = 4010 => NOT_FOUND, "Cart line not found";
    /// 金额超出 `Decimal` 范围
    AmountOutOfRange = 4011 => UNPROCESSABLE_ENTITY, "Amount is out of range";

    // 5xxx 收款
    PaymentFailed = 5001 => BAD_GATEWAY, "Payment could not be processed";

    // 6xxx 菜单
    MenuItemNotFound = 6001 => NOT_FOUND, "Menu item not found";
    /// 价格无法解析为数字
    MenuItemInvalidPrice = 6002 => BAD_REQUEST, "Menu item price is invalid";

    // 9xxx 系统
    InternalError = 9001 => INTERNAL_SERVER_ERROR, "Internal server error";
    BackendError = 9002 => BAD_GATEWAY, "Backend error";
    NetworkError = 9003 => SERVICE_UNAVAILABLE, "Network error";
    TimeoutError = 9004 => GATEWAY_TIMEOUT, "Operation timed out";
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.code(), f)
    }
}

/// 不在错误码表中的数值
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);
