//! Order Repository
//!
//! Orders are validated on read. A single-row result that does not have the
//! fixed shape fails with a decode error; list reads log and skip such rows
//! so one bad row does not hide every other order.

use std::sync::Arc;

use caja_client::{ClientError, DataClient, Query, decode_row};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::models::{Collection, MarkPaid, NewOrder, Order, RecordId};

use super::{BaseRepository, RepoResult};

const COLLECTION: Collection = Collection::Orders;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self {
            base: BaseRepository::new(data),
        }
    }

    /// Unpaid orders, newest first
    pub async fn find_unpaid(&self) -> RepoResult<Vec<Order>> {
        let query = Query::new()
            .eq("pagado", false)
            .order_by("creado_at", true);
        let rows = self.base.data().select(COLLECTION, &query).await?;
        decode_orders(rows)
    }

    /// Paid orders created at or after `since`
    pub async fn find_paid_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Order>> {
        let query = Query::new()
            .eq("pagado", true)
            .gte("creado_at", since.to_rfc3339());
        let rows = self.base.data().select(COLLECTION, &query).await?;
        decode_orders(rows)
    }

    /// Insert a new order; returns it as stored
    pub async fn create(&self, order: &NewOrder) -> RepoResult<Order> {
        let row = serde_json::to_value(order)?;
        let created = self.base.data().insert(COLLECTION, row).await?;
        decode_order(created)
    }

    /// Flip the paid flag to true
    pub async fn mark_paid(&self, id: &RecordId) -> RepoResult<Order> {
        let patch = serde_json::to_value(MarkPaid::default())?;
        let updated = self.base.data().update(COLLECTION, id, patch).await?;
        decode_order(updated)
    }
}

/// Decode and validate one order row
pub fn decode_order(row: Value) -> RepoResult<Order> {
    let order: Order = decode_row(COLLECTION, row)?;
    order.validate().map_err(|e| ClientError::Decode {
        collection: COLLECTION,
        message: e.to_string(),
    })?;
    Ok(order)
}

fn decode_orders(rows: Vec<Value>) -> RepoResult<Vec<Order>> {
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            decode_order(row)
                .inspect_err(|e| tracing::warn!(order_id = %id, error = %e, "Skipping malformed order row"))
                .ok()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use caja_client::memory::MemoryBackend;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn repo(memory: &MemoryBackend) -> OrderRepository {
        OrderRepository::new(Arc::new(memory.clone()))
    }

    fn row(total: f64, paid: bool, created_at: DateTime<Utc>) -> Value {
        json!({
            "mesero_id": "w1",
            "tipo_servicio": "local",
            "pagado": paid,
            "total": total,
            "creado_at": created_at.to_rfc3339(),
            "items": [{"id": 1, "nombre": "Taco", "cantidad": 1, "precio": total, "observaciones": ""}]
        })
    }

    #[tokio::test]
    async fn test_find_unpaid_newest_first() {
        let memory = MemoryBackend::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        memory.seed(
            Collection::Orders,
            [
                row(5.0, false, base),
                row(6.0, true, base + Duration::minutes(5)),
                row(7.0, false, base + Duration::minutes(10)),
            ],
        );

        let orders = repo(&memory).find_unpaid().await.unwrap();
        let totals: Vec<Decimal> = orders.iter().map(|o| o.total).collect();
        assert_eq!(totals, vec![Decimal::from(7), Decimal::from(5)]);
    }

    #[tokio::test]
    async fn test_find_paid_since_is_inclusive() {
        let memory = MemoryBackend::new();
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        memory.seed(
            Collection::Orders,
            [
                row(1.0, true, midnight - Duration::seconds(1)),
                row(2.0, true, midnight),
                row(3.0, false, midnight + Duration::hours(1)),
            ],
        );

        let orders = repo(&memory).find_paid_since(midnight).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total, Decimal::from(2));
    }

    #[tokio::test]
    async fn test_list_skips_malformed_rows() {
        let memory = MemoryBackend::new();
        memory.seed(
            Collection::Orders,
            [
                json!({
                    "tipo_servicio": "llevar",
                    "total": 3,
                    "items": [{"id": 1, "nombre": "Taco", "cantidad": 0, "precio": 3}]
                }),
                json!({"tipo_servicio": "delivery", "total": 1, "items": []}),
                row(4.0, false, Utc::now()),
            ],
        );

        let orders = repo(&memory).find_unpaid().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total, Decimal::from(4));
    }

    #[test]
    fn test_single_row_decode_rejects_malformed_items() {
        let err = decode_order(json!({
            "id": 1,
            "creado_at": "2024-05-01T18:00:00+00:00",
            "tipo_servicio": "llevar",
            "total": 3,
            "items": [{"id": 1, "nombre": "Taco", "cantidad": 0, "precio": 3}]
        }))
        .unwrap_err();
        assert!(matches!(err, ClientError::Decode { collection: Collection::Orders, .. }));
    }

    #[tokio::test]
    async fn test_mark_paid() {
        let memory = MemoryBackend::new();
        let stored = memory.seed(Collection::Orders, [row(4.0, false, Utc::now())]);
        let id: RecordId = serde_json::from_value(stored[0]["id"].clone()).unwrap();

        let order = repo(&memory).mark_paid(&id).await.unwrap();
        assert!(order.paid);
        assert!(repo(&memory).find_unpaid().await.unwrap().is_empty());
    }
}
