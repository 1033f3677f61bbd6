//! Row filters and ordering
//!
//! A [`Query`] renders to REST query parameters (`col=eq.v`, `col=gte.v`,
//! `order=col.desc`). The in-process backend evaluates the same query
//! against its rows.

#[cfg(any(test, feature = "in-process"))]
use serde_json::Value;
#[cfg(any(test, feature = "in-process"))]
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// `column >= value`
    Gte { column: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Select query over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Gte {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            descending,
        });
        self
    }

    /// REST query parameters, always selecting every column
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &self.filters {
            match filter {
                Filter::Eq { column, value } => params.push((column.clone(), format!("eq.{value}"))),
                Filter::Gte { column, value } => {
                    params.push((column.clone(), format!("gte.{value}")))
                }
            }
        }
        if let Some(order) = &self.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        params
    }

    /// Whether `row` passes every filter
    #[cfg(any(test, feature = "in-process"))]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq { column, value } => row
                .get(column)
                .is_some_and(|cell| compare_cell(cell, value) == Some(Ordering::Equal)),
            Filter::Gte { column, value } => row.get(column).is_some_and(|cell| {
                matches!(
                    compare_cell(cell, value),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }),
        })
    }

    /// Filter and order `rows`
    #[cfg(any(test, feature = "in-process"))]
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.iter().filter(|r| self.matches(r)).cloned().collect();
        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ord = compare_cells(a.get(&order.column), b.get(&order.column));
                if order.descending { ord.reverse() } else { ord }
            });
        }
        selected
    }
}

/// Compare a cell against a filter literal
///
/// Timestamps compare as instants, numbers numerically, everything else as text.
#[cfg(any(test, feature = "in-process"))]
fn compare_cell(cell: &Value, literal: &str) -> Option<Ordering> {
    use shared::models::serde_helpers::parse_timestamp;

    match cell {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string().as_str().cmp(literal)),
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            let rhs: f64 = literal.parse().ok()?;
            lhs.partial_cmp(&rhs)
        }
        Value::String(s) => match (parse_timestamp(s), parse_timestamp(literal)) {
            (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
            _ => Some(s.as_str().cmp(literal)),
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(any(test, feature = "in-process"))]
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let literal = match b {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            compare_cell(a, &literal).unwrap_or(Ordering::Equal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params() {
        let query = Query::new()
            .eq("pagado", false)
            .gte("creado_at", "2024-05-01T00:00:00+02:00")
            .order_by("creado_at", true);
        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("pagado".to_string(), "eq.false".to_string()),
                ("creado_at".to_string(), "gte.2024-05-01T00:00:00+02:00".to_string()),
                ("order".to_string(), "creado_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_apply_filters_and_orders() {
        let rows = vec![
            json!({"id": 1, "pagado": false, "creado_at": "2024-05-01T08:00:00+00:00"}),
            json!({"id": 2, "pagado": true, "creado_at": "2024-05-01T09:00:00+00:00"}),
            json!({"id": 3, "pagado": false, "creado_at": "2024-05-01T10:00:00+00:00"}),
        ];
        let unpaid = Query::new().eq("pagado", false).order_by("creado_at", true).apply(&rows);
        let ids: Vec<_> = unpaid.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1)]);

        // 10:30 in +02:00 is 08:30 UTC
        let later = Query::new().gte("creado_at", "2024-05-01T10:30:00+02:00").apply(&rows);
        assert_eq!(later.len(), 2);
    }

    #[test]
    fn test_numeric_and_text_equality() {
        let row = json!({"id": 7, "categoria_id": "abc", "disponible": true});
        assert!(Query::new().eq("id", 7).matches(&row));
        assert!(Query::new().eq("categoria_id", "abc").matches(&row));
        assert!(Query::new().eq("disponible", true).matches(&row));
        assert!(!Query::new().eq("id", 8).matches(&row));
        assert!(!Query::new().eq("missing", 1).matches(&row));
    }

    #[test]
    fn test_order_by_name() {
        let rows = vec![json!({"nombre": "Tacos"}), json!({"nombre": "Bebidas"})];
        let sorted = Query::new().order_by("nombre", false).apply(&rows);
        assert_eq!(sorted[0]["nombre"], "Bebidas");
    }
}
