//! 错误码分段

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// 按错误码千位划分的领域
///
/// 未分配的区段一律视为 [`ErrorCategory::System`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Order,
    Payment,
    Menu,
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            4 => Self::Order,
            5 => Self::Payment,
            6 => Self::Menu,
            _ => Self::System,
        }
    }

    /// 是否需要服务端记录 error 日志
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
