//! In-process backend
//!
//! Keeps the three tables, the user store and the change feed in memory.
//! Used by tests in place of the hosted backend; supports failure and
//! latency injection per collection and operation.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use shared::message::ChangeEvent;
use shared::models::{Collection, RecordId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthClient, AuthSession, AuthUser};
use crate::data::DataClient;
use crate::query::Query;
use crate::realtime::{ChangeFeed, Subscription};
use crate::{ClientError, ClientResult};

/// Backend operation, used to target injected failures and latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<Collection, Vec<Value>>,
}

#[derive(Default)]
struct Users {
    /// email -> (password, user)
    accounts: HashMap<String, (String, AuthUser)>,
    /// access token -> user
    sessions: HashMap<String, AuthUser>,
}

struct Inner {
    tables: Mutex<Tables>,
    users: Mutex<Users>,
    next_id: AtomicI64,
    failures: Mutex<HashMap<(Collection, Operation), String>>,
    latency: Mutex<HashMap<(Collection, Operation), Duration>>,
    calls: Mutex<HashMap<(Collection, Operation), usize>>,
    changes: broadcast::Sender<ChangeEvent>,
    subscriptions: Mutex<Vec<CancellationToken>>,
}

/// In-memory backend implementing [`DataClient`], [`AuthClient`] and [`ChangeFeed`]
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                users: Mutex::new(Users::default()),
                next_id: AtomicI64::new(1),
                failures: Mutex::new(HashMap::new()),
                latency: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
                changes,
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    // ========== Test setup ==========

    /// Store rows directly, without change notifications; returns them with ids
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let stored: Vec<Value> = rows
            .into_iter()
            .map(|row| self.with_defaults(collection, row))
            .collect();
        self.inner
            .tables
            .lock()
            .rows
            .entry(collection)
            .or_default()
            .extend(stored.iter().cloned());
        stored
    }

    /// Current rows of a collection, in insertion order
    pub fn rows(&self, collection: Collection) -> Vec<Value> {
        self.inner
            .tables
            .lock()
            .rows
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Register an account that can sign in
    pub fn add_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.inner
            .users
            .lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Make every `op` on `collection` fail with `message` until [`Self::recover`]
    pub fn fail(&self, collection: Collection, op: Operation, message: impl Into<String>) {
        self.inner
            .failures
            .lock()
            .insert((collection, op), message.into());
    }

    pub fn recover(&self, collection: Collection, op: Operation) {
        self.inner.failures.lock().remove(&(collection, op));
    }

    /// Delay every `op` on `collection` by `delay`
    pub fn set_latency(&self, collection: Collection, op: Operation, delay: Duration) {
        self.inner.latency.lock().insert((collection, op), delay);
    }

    /// Number of `op` calls made on `collection`
    pub fn calls(&self, collection: Collection, op: Operation) -> usize {
        self.inner
            .calls
            .lock()
            .get(&(collection, op))
            .copied()
            .unwrap_or(0)
    }

    /// Push a change event to subscribers, as the realtime service would
    pub fn emit(&self, event: ChangeEvent) {
        let _ = self.inner.changes.send(event);
    }

    /// Subscriptions that have not been closed
    pub fn active_subscriptions(&self) -> usize {
        let mut subs = self.inner.subscriptions.lock();
        subs.retain(|token| !token.is_cancelled());
        subs.len()
    }

    // ========== Internals ==========

    /// Fill generated columns the way the database defaults would
    fn with_defaults(&self, collection: Collection, row: Value) -> Value {
        let mut map = match row {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.entry("id")
            .or_insert_with(|| json!(self.inner.next_id.fetch_add(1, Ordering::Relaxed)));
        match collection {
            Collection::Orders => {
                map.entry("creado_at")
                    .or_insert_with(|| json!(chrono::Utc::now().to_rfc3339()));
                map.entry("pagado").or_insert(json!(false));
            }
            Collection::MenuItems => {
                map.entry("disponible").or_insert(json!(true));
            }
            Collection::Categories => {}
        }
        Value::Object(map)
    }

    /// Count the call, apply latency, then any injected failure
    async fn enter(&self, collection: Collection, op: Operation) -> ClientResult<()> {
        *self.inner.calls.lock().entry((collection, op)).or_insert(0) += 1;
        let delay = self.inner.latency.lock().get(&(collection, op)).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.inner.failures.lock().get(&(collection, op)) {
            Some(message) => Err(ClientError::Backend {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn find_index(rows: &[Value], id: &RecordId) -> Option<usize> {
        rows.iter().position(|row| {
            row.get("id")
                .and_then(|v| serde_json::from_value::<RecordId>(v.clone()).ok())
                .is_some_and(|row_id| &row_id == id)
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataClient for MemoryBackend {
    async fn select(&self, collection: Collection, query: &Query) -> ClientResult<Vec<Value>> {
        self.enter(collection, Operation::Select).await?;
        Ok(query.apply(&self.rows(collection)))
    }

    async fn insert(&self, collection: Collection, row: Value) -> ClientResult<Value> {
        self.enter(collection, Operation::Insert).await?;
        let stored = self.with_defaults(collection, row);
        self.inner
            .tables
            .lock()
            .rows
            .entry(collection)
            .or_default()
            .push(stored.clone());
        self.emit(ChangeEvent::inserted(collection, stored.clone()));
        Ok(stored)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Value,
    ) -> ClientResult<Value> {
        self.enter(collection, Operation::Update).await?;
        let updated = {
            let mut tables = self.inner.tables.lock();
            let rows = tables.rows.entry(collection).or_default();
            let index = Self::find_index(rows, id).ok_or_else(|| ClientError::NotFound {
                collection,
                id: id.clone(),
            })?;
            if let (Value::Object(row), Value::Object(patch)) = (&mut rows[index], patch) {
                row.extend(patch);
            }
            rows[index].clone()
        };
        self.emit(ChangeEvent::updated(collection, updated.clone()));
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> ClientResult<()> {
        self.enter(collection, Operation::Delete).await?;
        let removed = {
            let mut tables = self.inner.tables.lock();
            let rows = tables.rows.entry(collection).or_default();
            Self::find_index(rows, id).map(|index| rows.remove(index))
        };
        if removed.is_some() {
            self.emit(ChangeEvent::deleted(collection, json!({"id": id})));
        }
        Ok(())
    }

    fn authorized(&self, _access_token: &str) -> Arc<dyn DataClient> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl AuthClient for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let mut users = self.inner.users.lock();
        let user = match users.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => {
                return Err(ClientError::Backend {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                });
            }
        };
        let access_token = uuid::Uuid::new_v4().to_string();
        users.sessions.insert(access_token.clone(), user.clone());
        Ok(AuthSession {
            access_token,
            refresh_token: None,
            expires_in: Some(3600),
            user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> ClientResult<()> {
        self.inner.users.lock().sessions.remove(access_token);
        Ok(())
    }

    async fn user(&self, access_token: &str) -> ClientResult<AuthUser> {
        self.inner
            .users
            .lock()
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(ClientError::Unauthorized)
    }
}

#[async_trait]
impl ChangeFeed for MemoryBackend {
    async fn subscribe(&self, collection: Collection) -> ClientResult<Subscription> {
        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let mut changes = self.inner.changes.subscribe();
        self.inner.subscriptions.lock().push(cancel.clone());

        // a fresh subscription starts with a resync, like a realtime (re)connect
        let _ = tx.send(ChangeEvent::resync(collection)).await;

        let token = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    received = changes.recv() => match received {
                        Ok(event) if event.collection == collection => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            if tx.send(ChangeEvent::resync(collection)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
        Ok(Subscription::new(rx, cancel))
    }

    fn authorized(&self, _access_token: &str) -> Arc<dyn ChangeFeed> {
        Arc::new(self.clone())
    }
}
