//! 视图层
//!
//! 四个界面背后的状态和操作：
//! - [`catalog`] - 菜单目录
//! - [`intake`] - 点单台 (购物车、提交订单)
//! - [`cashier`] - 未付款订单监控
//! - [`reports`] - 日销售报表
//! - [`inventory`] - 库存管理
//!
//! 所有后端访问都通过请求的 [`SessionContext`](crate::auth::SessionContext)
//! 进行；视图之间除后端外不共享可变状态。

pub mod cashier;
pub mod catalog;
pub mod intake;
pub mod inventory;
pub mod reports;

pub use cashier::{CashierMonitor, PendingOrders};
pub use catalog::Catalog;
pub use intake::{Desk, DeskView, Desks};
pub use inventory::{Inventory, InventoryFilter, NewMenuItem};
pub use reports::{CategoryRevenue, DailySales};
