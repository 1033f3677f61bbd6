//! Backend collections (tables)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three record collections the application reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// `categorias`
    Categories,
    /// `platos`
    MenuItems,
    /// `pedidos`
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Categories,
        Collection::MenuItems,
        Collection::Orders,
    ];

    /// Table name in the backend schema
    pub const fn table(&self) -> &'static str {
        match self {
            Collection::Categories => "categorias",
            Collection::MenuItems => "platos",
            Collection::Orders => "pedidos",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Unknown table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCollection(pub String);

impl fmt::Display for UnknownCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown collection: {}", self.0)
    }
}

impl std::error::Error for UnknownCollection {}

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.table() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(c.table().parse::<Collection>(), Ok(c));
        }
        assert!("mesas".parse::<Collection>().is_err());
    }
}
