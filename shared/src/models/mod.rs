//! Data models
//!
//! Record types mirrored from the hosted backend's tables. Rust field names are
//! English; wire names keep the backend's column names via serde renames.
//! Every row is decoded into one of these fixed shapes when it is read.

pub mod category;
pub mod collection;
pub mod id;
pub mod menu_item;
pub mod order;
pub mod serde_helpers;

// Re-exports
pub use category::*;
pub use collection::*;
pub use id::*;
pub use menu_item::*;
pub use order::*;
