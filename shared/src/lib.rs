//! Shared types for Caja
//!
//! Common types used across the workspace: the record model mirrored from the
//! hosted backend, the waiter cart aggregator, realtime change events, and the
//! unified error / response envelope.

pub mod cart;
pub mod client;
pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use cart::{Cart, CartLine};
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{ChangeEvent, ChangeKind};
