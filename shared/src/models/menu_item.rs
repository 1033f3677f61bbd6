//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RecordId;
use super::serde_helpers::null_as_default;

/// Menu item entity (`platos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "precio", serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    /// Category reference; may dangle after the category is deleted
    #[serde(rename = "categoria_id", default)]
    pub category_id: Option<RecordId>,
    #[serde(rename = "disponible", default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl MenuItem {
    /// Case-insensitive substring match on name or description.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    pub fn in_category(&self, category_id: &RecordId) -> bool {
        self.category_id.as_ref() == Some(category_id)
    }
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio", serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(rename = "categoria_id")]
    pub category_id: RecordId,
    #[serde(rename = "disponible", default = "default_true")]
    pub available: bool,
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "precio",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
    #[serde(rename = "categoria_id", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<RecordId>,
    #[serde(rename = "disponible", default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category_id.is_none()
            && self.available.is_none()
    }
}
