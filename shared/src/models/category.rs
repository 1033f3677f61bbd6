//! Category Model

use serde::{Deserialize, Serialize};

use super::RecordId;

/// Category entity (`categorias`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Optional icon label, e.g. `burger`
    #[serde(rename = "icono", default)]
    pub icon: Option<String>,
}

/// Create category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCreate {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "icono", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CategoryCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icon = (!icon.trim().is_empty()).then_some(icon);
        self
    }
}
