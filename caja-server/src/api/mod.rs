//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录/登出
//! - [`menu`] - 点单台菜单
//! - [`cart`] - 点单台购物车和提交
//! - [`cashier`] - 收银 (未付款订单、付款、实时推送)
//! - [`inventory`] - 库存管理
//! - [`reports`] - 日销售报表

pub mod auth;
pub mod cart;
pub mod cashier;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod reports;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppResult};
