//! 收银监控
//!
//! 维护未付款订单集合 (`pagado = false`，按 `creado_at` 倒序)，
//! 并提供"标记已付"操作。
//!
//! # 生命周期
//!
//! 第一个会话出现时启动：订阅订单表的变化，并做一次全量加载。
//! 持有订阅的会话登出时停止，有其他会话则以该会话身份重新启动。
//! 每次运行有自己的 [`CancellationToken`]，停止后才完成的加载会被丢弃，
//! 不会改动状态。
//!
//! # 变化处理
//!
//! | 事件 | 处理 |
//! |------|------|
//! | insert / update (带可解码的行) | 增量：按 id 替换，已付则移除 |
//! | delete (带行 id) | 增量：按 id 移除 |
//! | 其他 (resync、缺少身份信息) | 全量重新加载 |

use std::sync::Arc;

use caja_client::{ChangeFeed, DataClient};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shared::message::{ChangeEvent, ChangeKind};
use shared::models::{Collection, Order, RecordId};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::auth::{SessionContext, SessionListener};
use crate::db::OrderRepository;
use crate::db::repository::order::decode_order;
use crate::utils::{AppResult, BackendResultExt, ErrorCode};

pub const ORDERS_LOAD_FAILED: &str = "Error cargando pedidos";
pub const PAYMENT_FAILED: &str = "No se pudo procesar pago";
pub const PAID: &str = "Pago procesado";
pub const PAID_DETAIL: &str = "Pedido marcado como pagado.";

/// 推送给收银界面的缓冲区大小
const UPDATE_BUFFER: usize = 16;

/// 未付款订单快照
#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingOrders {
    pub orders: Vec<Order>,
    /// 是否至少成功加载过一次
    pub loaded: bool,
    /// 最近一次加载失败的后端信息
    pub last_error: Option<String>,
}

struct Shared {
    pending: RwLock<PendingOrders>,
    updates: broadcast::Sender<Arc<Vec<Order>>>,
}

impl Shared {
    /// 在写锁内检查取消，停止后的结果不会落地
    fn commit(&self, cancel: &CancellationToken, change: impl FnOnce(&mut PendingOrders)) -> bool {
        let mut pending = self.pending.write();
        if cancel.is_cancelled() {
            return false;
        }
        change(&mut pending);
        let _ = self.updates.send(Arc::new(pending.orders.clone()));
        true
    }

    /// 应用一个变化事件
    ///
    /// `None`: 已停止；`Some(false)`: 需要全量加载
    fn apply(&self, cancel: &CancellationToken, event: &ChangeEvent) -> Option<bool> {
        let mut pending = self.pending.write();
        if cancel.is_cancelled() {
            return None;
        }
        if !apply_delta(&mut pending.orders, event) {
            return Some(false);
        }
        let _ = self.updates.send(Arc::new(pending.orders.clone()));
        Some(true)
    }

    /// 全量加载未付款订单
    async fn refresh(&self, data: Arc<dyn DataClient>, cancel: &CancellationToken) -> AppResult<()> {
        let result = OrderRepository::new(data)
            .find_unpaid()
            .await
            .or_surface(ErrorCode::BackendError, ORDERS_LOAD_FAILED);

        let committed = match &result {
            Ok(orders) => self.commit(cancel, |pending| {
                pending.orders = orders.clone();
                pending.loaded = true;
                pending.last_error = None;
            }),
            Err(e) => {
                let message = e.description().unwrap_or(&e.message).to_string();
                self.commit(cancel, |pending| pending.last_error = Some(message))
            }
        };

        if !committed {
            tracing::debug!("Discarded refresh finished after monitor stop");
        }
        result.map(|_| ())
    }
}

struct Running {
    cancel: CancellationToken,
    /// 持有订阅的会话令牌
    owner: String,
}

/// 未付款订单监控
pub struct CashierMonitor {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
    realtime: bool,
}

impl CashierMonitor {
    /// `realtime` 为 false 时不订阅变化，只在启动和付款后加载
    pub fn new(realtime: bool) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            shared: Arc::new(Shared {
                pending: RwLock::new(PendingOrders::default()),
                updates,
            }),
            running: Mutex::new(None),
            realtime,
        }
    }

    /// 以 `session` 的身份启动；已在运行时不做任何事
    pub fn start(&self, session: &SessionContext) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        *running = Some(Running {
            cancel: cancel.clone(),
            owner: session.access_token.clone(),
        });

        tracing::info!(user_id = %session.user_id(), realtime = self.realtime, "Cashier monitor started");

        let shared = self.shared.clone();
        let data = session.backend.data.clone();
        let feed = self.realtime.then(|| session.backend.feed.clone());
        tokio::spawn(run(shared, data, feed, cancel));
    }

    /// 停止并释放订阅
    pub fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        // 与 commit 互斥：取消之后不会再有写入
        let _pending = self.shared.pending.write();
        running.cancel.cancel();
        tracing::info!("Cashier monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// 当前未付款订单
    pub fn orders(&self) -> Vec<Order> {
        self.shared.pending.read().orders.clone()
    }

    pub fn snapshot(&self) -> PendingOrders {
        self.shared.pending.read().clone()
    }

    /// 订阅集合变化 (每次变化推送完整列表)
    pub fn updates(&self) -> broadcast::Receiver<Arc<Vec<Order>>> {
        self.shared.updates.subscribe()
    }

    /// 主动全量加载
    pub async fn refresh(&self, session: &SessionContext) -> AppResult<Vec<Order>> {
        let cancel = self.current_token();
        self.shared
            .refresh(session.backend.data.clone(), &cancel)
            .await?;
        Ok(self.orders())
    }

    /// 收银界面读取：未加载过或没有实时订阅时先加载
    pub async fn current(&self, session: &SessionContext) -> AppResult<PendingOrders> {
        if !self.realtime || !self.shared.pending.read().loaded {
            self.refresh(session).await?;
        }
        Ok(self.snapshot())
    }

    /// 标记订单已付款，随后无条件全量加载
    ///
    /// 付款成功而加载失败时仍返回成功，加载错误记录在快照中。
    pub async fn mark_paid(&self, session: &SessionContext, id: &RecordId) -> AppResult<Order> {
        let order = OrderRepository::new(session.backend.data.clone())
            .mark_paid(id)
            .await
            .or_surface(ErrorCode::PaymentFailed, PAYMENT_FAILED)?;

        tracing::info!(
            order_id = %order.id,
            cashier_id = %session.user_id(),
            total = %order.total,
            "Order marked paid"
        );

        if let Err(e) = self.refresh(session).await {
            tracing::warn!(error = %e, "Refresh after payment failed");
        }
        Ok(order)
    }

    /// 运行中使用当前令牌，否则使用新令牌
    fn current_token(&self) -> CancellationToken {
        self.running
            .lock()
            .as_ref()
            .map(|r| r.cancel.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CashierMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashierMonitor")
            .field("realtime", &self.realtime)
            .field("running", &self.is_running())
            .field("pending", &self.shared.pending.read().orders.len())
            .finish()
    }
}

impl SessionListener for CashierMonitor {
    fn on_sign_in(&self, session: &SessionContext) {
        self.start(session);
    }

    fn on_sign_out(&self, session: &SessionContext, remaining: &[SessionContext]) {
        let owned = self
            .running
            .lock()
            .as_ref()
            .is_some_and(|r| r.owner == session.access_token);
        if !owned {
            return;
        }

        self.stop();
        if let Some(next) = remaining.first() {
            self.start(next);
        }
    }
}

/// 监控任务：订阅、首次加载、处理变化直到取消
async fn run(
    shared: Arc<Shared>,
    data: Arc<dyn DataClient>,
    feed: Option<Arc<dyn ChangeFeed>>,
    cancel: CancellationToken,
) {
    let subscription = match feed {
        Some(feed) => match feed.subscribe(Collection::Orders).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(error = %e, "Order change feed unavailable");
                None
            }
        },
        None => None,
    };

    if let Err(e) = shared.refresh(data.clone(), &cancel).await {
        tracing::warn!(error = %e, "Initial order load failed");
    }

    let Some(mut subscription) = subscription else {
        return;
    };

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = subscription.next() => {
                let Some(event) = event else {
                    tracing::warn!("Order change feed closed");
                    break;
                };
                tracing::debug!(kind = %event.kind, row_id = ?event.row_id, "Order change");

                if shared.apply(&cancel, &event) == Some(false)
                    && let Err(e) = shared.refresh(data.clone(), &cancel).await
                {
                    tracing::warn!(error = %e, "Order reload failed");
                }
            }
        }
    }

    subscription.close();
    tracing::debug!("Order change subscription released");
}

/// 把变化应用到按 `creado_at` 倒序的未付款列表
///
/// 返回 false 表示事件缺少足够信息，需要全量加载。
pub fn apply_delta(orders: &mut Vec<Order>, event: &ChangeEvent) -> bool {
    match event.kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let Some(order) = event.record.clone().and_then(|row| decode_order(row).ok()) else {
                return false;
            };
            orders.retain(|o| o.id != order.id);
            if !order.paid {
                let position = orders
                    .iter()
                    .position(|o| o.created_at < order.created_at)
                    .unwrap_or(orders.len());
                orders.insert(position, order);
            }
            true
        }
        ChangeKind::Delete => match &event.row_id {
            Some(id) => {
                orders.retain(|o| &o.id != id);
                true
            }
            None => false,
        },
        ChangeKind::Resync => false,
    }
}
