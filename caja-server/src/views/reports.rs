//! 日销售报表
//!
//! 统计窗口为营业时区的今天零点 (含) 至今，只统计已付款订单。
//! 分类归属按菜品 ID 查当前菜单，金额使用订单中的快照价格；
//! 菜品或其分类已不存在时归入 "Sin categoría"。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{AmountOverflow, Category, MenuItem, Order, RecordId, checked_sum};

use crate::auth::SessionContext;
use crate::db::{CategoryRepository, MenuItemRepository, OrderRepository};
use crate::utils::time::today_start;
use crate::utils::{AppResult, BackendResultExt, ErrorCode, amount_out_of_range};

pub const REPORTS_LOAD_FAILED: &str = "Error cargando reportes";
pub const UNCATEGORIZED: &str = "Sin categoría";

/// 某分类的销售额
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub revenue: Decimal,
}

/// 今日销售
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub window_start: DateTime<Utc>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub order_count: usize,
    /// 按销售额降序，相同金额保持首次出现的顺序
    pub by_category: Vec<CategoryRevenue>,
}

impl DailySales {
    /// 加载今日已付款订单和当前菜单并汇总
    pub async fn load(session: &SessionContext, tz: Option<Tz>) -> AppResult<Self> {
        let window_start = today_start(Utc::now(), tz);
        let data = &session.backend.data;

        let orders = OrderRepository::new(data.clone())
            .find_paid_since(window_start)
            .await
            .or_surface(ErrorCode::BackendError, REPORTS_LOAD_FAILED)?;
        let items = MenuItemRepository::new(data.clone())
            .find_all()
            .await
            .or_surface(ErrorCode::BackendError, REPORTS_LOAD_FAILED)?;
        let categories = CategoryRepository::new(data.clone())
            .find_all()
            .await
            .or_surface(ErrorCode::BackendError, REPORTS_LOAD_FAILED)?;

        let sales =
            aggregate(window_start, &orders, &items, &categories).map_err(amount_out_of_range)?;
        tracing::debug!(
            window_start = %sales.window_start,
            orders = sales.order_count,
            total = %sales.total,
            "Daily sales computed"
        );
        Ok(sales)
    }
}

/// 汇总订单 (纯计算)；金额超出 `Decimal` 范围时失败
pub fn aggregate(
    window_start: DateTime<Utc>,
    orders: &[Order],
    items: &[MenuItem],
    categories: &[Category],
) -> Result<DailySales, AmountOverflow> {
    let item_category: HashMap<&RecordId, &RecordId> = items
        .iter()
        .filter_map(|item| item.category_id.as_ref().map(|c| (&item.id, c)))
        .collect();
    let category_name: HashMap<&RecordId, &str> = categories
        .iter()
        .map(|c| (&c.id, c.name.as_str()))
        .collect();

    let mut by_category: Vec<CategoryRevenue> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in orders.iter().flat_map(|order| &order.items) {
        let name = item_category
            .get(&line.id)
            .and_then(|category_id| category_name.get(category_id))
            .copied()
            .unwrap_or(UNCATEGORIZED);

        let slot = *index.entry(name.to_string()).or_insert_with(|| {
            by_category.push(CategoryRevenue {
                name: name.to_string(),
                revenue: Decimal::ZERO,
            });
            by_category.len() - 1
        });
        let revenue = &mut by_category[slot].revenue;
        *revenue = revenue.checked_add(line.subtotal()?).ok_or(AmountOverflow)?;
    }

    // sort_by 是稳定排序
    by_category.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    Ok(DailySales {
        window_start,
        total: checked_sum(orders.iter().map(|o| Ok(o.total)))?,
        order_count: orders.len(),
        by_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::session;
    use caja_client::memory::{MemoryBackend, Operation};
    use serde_json::{Value, json};
    use shared::models::Collection;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn paid_order(lines: Value, total: f64) -> Value {
        json!({
            "mesero_id": "w1",
            "tipo_servicio": "local",
            "pagado": true,
            "total": total,
            "creado_at": Utc::now().to_rfc3339(),
            "items": lines
        })
    }

    fn line(id: i64, quantity: i32, price: f64) -> Value {
        json!({"id": id, "nombre": format!("item-{id}"), "cantidad": quantity, "precio": price, "observaciones": ""})
    }

    fn seed_menu(memory: &MemoryBackend) {
        memory.seed(
            Collection::Categories,
            [
                json!({"id": 1, "nombre": "Bebidas"}),
                json!({"id": 2, "nombre": "Platos"}),
            ],
        );
        memory.seed(
            Collection::MenuItems,
            [
                json!({"id": 10, "nombre": "Agua", "precio": 1.25, "categoria_id": 1}),
                json!({"id": 11, "nombre": "Pollo", "precio": 6.25, "categoria_id": 2}),
                json!({"id": 12, "nombre": "Huérfano", "precio": 1.0, "categoria_id": 99}),
            ],
        );
    }

    #[tokio::test]
    async fn test_three_paid_orders_today() {
        let memory = MemoryBackend::new();
        seed_menu(&memory);
        memory.seed(
            Collection::Orders,
            [
                paid_order(json!([line(10, 4, 1.25)]), 5.00),
                paid_order(json!([line(11, 2, 6.25)]), 12.50),
                paid_order(json!([line(10, 1, 1.25), line(11, 1, 6.00)]), 7.25),
                // 未付款和昨天的订单不计入
                json!({"tipo_servicio": "llevar", "pagado": false, "total": 9.0,
                       "items": [line(10, 1, 9.0)]}),
                json!({"tipo_servicio": "llevar", "pagado": true, "total": 9.0,
                       "creado_at": (Utc::now() - chrono::Duration::days(2)).to_rfc3339(),
                       "items": [line(10, 1, 9.0)]}),
            ],
        );

        let sales = DailySales::load(&session(&memory, "a1"), None).await.unwrap();
        assert_eq!(sales.total, dec("24.75"));
        assert_eq!(sales.order_count, 3);
        assert_eq!(
            sales.by_category,
            vec![
                CategoryRevenue { name: "Platos".into(), revenue: dec("18.50") },
                CategoryRevenue { name: "Bebidas".into(), revenue: dec("6.25") },
            ]
        );

        let by_category: Decimal = sales.by_category.iter().map(|c| c.revenue).sum();
        assert_eq!(by_category, sales.total);
    }

    #[tokio::test]
    async fn test_missing_item_or_category_is_uncategorized() {
        let memory = MemoryBackend::new();
        seed_menu(&memory);
        memory.seed(
            Collection::Orders,
            [paid_order(json!([line(12, 1, 2.0), line(404, 1, 3.0), line(10, 4, 1.25)]), 10.0)],
        );

        let sales = DailySales::load(&session(&memory, "a1"), None).await.unwrap();
        assert_eq!(
            sales.by_category,
            vec![
                CategoryRevenue { name: UNCATEGORIZED.into(), revenue: dec("5") },
                CategoryRevenue { name: "Bebidas".into(), revenue: dec("5") },
            ]
        );
    }

    #[tokio::test]
    async fn test_load_failure() {
        let memory = MemoryBackend::new();
        memory.fail(Collection::Categories, Operation::Select, "relation \"categorias\" does not exist");

        let err = DailySales::load(&session(&memory, "a1"), None).await.unwrap_err();
        assert_eq!(err.message, REPORTS_LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_out_of_range_revenue_is_an_error() {
        let memory = MemoryBackend::new();
        seed_menu(&memory);
        let huge = "50000000000000000000000000000";
        memory.seed(
            Collection::Orders,
            [
                paid_order(json!([{"id": 10, "nombre": "Agua", "cantidad": 2, "precio": huge}]), 1.0),
                paid_order(json!([line(10, 1, 1.0)]), 1.0),
            ],
        );

        let err = DailySales::load(&session(&memory, "a1"), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AmountOutOfRange);
    }

    #[test]
    fn test_empty_day() {
        let sales = aggregate(Utc::now(), &[], &[], &[]).unwrap();
        assert_eq!(sales.total, Decimal::ZERO);
        assert_eq!(sales.order_count, 0);
        assert!(sales.by_category.is_empty());
    }
}
