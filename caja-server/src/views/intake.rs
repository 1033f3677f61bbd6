//! 点单台
//!
//! 每个服务员 (按用户 ID) 一张点单台：购物车、服务类型选择和已加载的菜单。
//! 点单台放在 `tokio::sync::Mutex` 后面，提交期间一直持有锁，
//! 同一购物车不会被重复提交成两张订单。

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::Cart;
use shared::cart::CartLine;
use shared::models::{NewOrder, Order, RecordId, ServiceType};
use tokio::sync::Mutex;

use crate::auth::{SessionContext, SessionListener};
use crate::db::OrderRepository;
use crate::utils::{AppError, AppResult, BackendResultExt, ErrorCode, amount_out_of_range};
use crate::views::catalog::Catalog;

pub const SERVICE_TYPE_REQUIRED: &str = "Selecciona el tipo de servicio";
pub const CART_EMPTY: &str = "Carrito vacío";
pub const SUBMIT_FAILED: &str = "No se pudo enviar el pedido";
pub const SUBMITTED: &str = "Pedido enviado a caja";
pub const SUBMITTED_DETAIL: &str = "Se registró correctamente.";

/// 一个服务员的点单状态
#[derive(Debug, Default)]
pub struct Desk {
    cart: Cart,
    service_type: Option<ServiceType>,
    catalog: Option<Catalog>,
}

/// 点单台快照 (API 返回)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskView {
    pub lines: Vec<CartLine>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub service_type: Option<ServiceType>,
}

impl Desk {
    pub fn view(&self) -> AppResult<DeskView> {
        Ok(DeskView {
            lines: self.cart.snapshot(),
            total: self.cart.total().map_err(amount_out_of_range)?,
            service_type: self.service_type,
        })
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn service_type(&self) -> Option<ServiceType> {
        self.service_type
    }

    /// 重新加载菜单；失败时保留之前的菜单
    pub async fn reload_catalog(&mut self, session: &SessionContext) -> AppResult<&Catalog> {
        let catalog = Catalog::load(session).await?;
        Ok(self.catalog.insert(catalog))
    }

    /// 把菜品加入购物车
    ///
    /// 在已加载的菜单中查找；找不到时重新加载一次再找。
    pub async fn add_item(&mut self, session: &SessionContext, item_id: &RecordId) -> AppResult<()> {
        let cached = self
            .catalog
            .as_ref()
            .and_then(|catalog| catalog.find(item_id))
            .cloned();

        let item = match cached {
            Some(item) => item,
            None => self
                .reload_catalog(session)
                .await?
                .find(item_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::new(ErrorCode::MenuItemNotFound).with_detail("id", item_id.as_str())
                })?,
        };

        self.cart.add(&item).map_err(amount_out_of_range)
    }

    pub fn increment(&mut self, index: usize) -> AppResult<()> {
        let found = self.cart.increment(index).map_err(amount_out_of_range)?;
        line_found(found, index)
    }

    pub fn decrement(&mut self, index: usize) -> AppResult<()> {
        line_found(self.cart.decrement(index), index)
    }

    pub fn remove(&mut self, index: usize) -> AppResult<()> {
        line_found(self.cart.remove(index), index)
    }

    pub fn set_note(&mut self, index: usize, note: impl Into<String>) -> AppResult<()> {
        line_found(self.cart.set_note(index, note), index)
    }

    pub fn set_service_type(&mut self, service_type: Option<ServiceType>) {
        self.service_type = service_type;
    }

    /// 提交订单
    ///
    /// 先检查服务类型，再检查购物车；校验失败不发起任何写入。
    /// 写入失败时购物车和服务类型保持不变，成功后清空。
    pub async fn submit(&mut self, session: &SessionContext) -> AppResult<Order> {
        let Some(service_type) = self.service_type else {
            return Err(AppError::with_message(
                ErrorCode::ServiceTypeRequired,
                SERVICE_TYPE_REQUIRED,
            ));
        };
        if self.cart.is_empty() {
            return Err(AppError::with_message(ErrorCode::OrderEmpty, CART_EMPTY));
        }

        let order = NewOrder::new(session.user_id(), service_type, self.cart.snapshot())
            .map_err(amount_out_of_range)?;
        let created = OrderRepository::new(session.backend.data.clone())
            .create(&order)
            .await
            .or_surface(ErrorCode::OrderSubmitFailed, SUBMIT_FAILED)?;

        tracing::info!(
            order_id = %created.id,
            waiter_id = %session.user_id(),
            service_type = %service_type,
            lines = created.items.len(),
            total = %created.total,
            "Order submitted"
        );

        self.cart.clear();
        self.service_type = None;
        Ok(created)
    }
}

fn line_found(found: bool, index: usize) -> AppResult<()> {
    if found {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::CartLineNotFound).with_detail("index", index))
    }
}

/// 所有服务员的点单台
#[derive(Debug, Default)]
pub struct Desks {
    desks: DashMap<String, Arc<Mutex<Desk>>>,
}

impl Desks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用户的点单台，不存在时创建
    pub fn desk(&self, user_id: &str) -> Arc<Mutex<Desk>> {
        self.desks
            .entry(user_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.desks.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.desks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }
}

impl SessionListener for Desks {
    fn on_sign_in(&self, _session: &SessionContext) {}

    fn on_sign_out(&self, session: &SessionContext, remaining: &[SessionContext]) {
        let user_id = session.user_id();
        if remaining.iter().any(|s| s.user_id() == user_id) {
            return;
        }
        if self.desks.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Desk discarded");
        }
    }
}
