//! 集成测试公共设施
//!
//! 内存后端 + 完整中间件栈的路由，通过 `oneshot` 调用。

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use caja_client::Backend;
use caja_client::memory::MemoryBackend;
use caja_server::{Config, ServerState, build_app};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::Collection;
use tower::ServiceExt;

pub const WAITER_EMAIL: &str = "mesero@caja.test";
pub const CASHIER_EMAIL: &str = "caja@caja.test";
pub const PASSWORD: &str = "secreto";

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub memory: MemoryBackend,
}

impl TestApp {
    /// 带菜单和两个账号的应用
    pub fn new() -> Self {
        let memory = MemoryBackend::new();
        seed_menu(&memory);
        memory.add_user(WAITER_EMAIL, PASSWORD);
        memory.add_user(CASHIER_EMAIL, PASSWORD);

        let state = ServerState::new(Config::for_tests(), Backend::in_process(&memory));
        let app = build_app(&state);
        Self { app, state, memory }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// 登录并返回访问令牌
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

/// 分类: Bebidas(2), Comida(1)；菜品: Hamburguesa 4.50, Papas 2.00, Agua 1.25, Flan (不可售)
pub fn seed_menu(memory: &MemoryBackend) {
    memory.seed(
        Collection::Categories,
        [
            json!({"id": 1, "nombre": "Comida", "icono": "burger"}),
            json!({"id": 2, "nombre": "Bebidas"}),
        ],
    );
    memory.seed(
        Collection::MenuItems,
        [
            json!({"id": 10, "nombre": "Hamburguesa", "descripcion": "Con queso", "precio": 4.5, "categoria_id": 1}),
            json!({"id": 11, "nombre": "Papas", "precio": 2.0, "categoria_id": 1}),
            json!({"id": 12, "nombre": "Agua", "precio": 1.25, "categoria_id": 2}),
            json!({"id": 13, "nombre": "Flan", "precio": 3.0, "categoria_id": 1, "disponible": false}),
        ],
    );
}

/// 未付款订单行
pub fn unpaid_order(waiter: &str, total: f64, created_at: &str) -> Value {
    json!({
        "mesero_id": waiter,
        "tipo_servicio": "local",
        "pagado": false,
        "total": total,
        "creado_at": created_at,
        "items": [{"id": 10, "nombre": "Hamburguesa", "cantidad": 1, "precio": total, "observaciones": ""}]
    })
}

/// 列表中各行某字段的值
pub fn pluck(rows: &Value, field: &str) -> Vec<Value> {
    rows.as_array()
        .map(|rows| rows.iter().map(|row| row[field].clone()).collect())
        .unwrap_or_default()
}
