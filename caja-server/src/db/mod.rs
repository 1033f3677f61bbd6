//! 数据访问层
//!
//! 后端表的类型化仓储；行在读取时解码为固定结构。

pub mod repository;

pub use repository::{CategoryRepository, MenuItemRepository, OrderRepository};
