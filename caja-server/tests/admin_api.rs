//! 库存管理和日报

mod common;

use caja_client::memory::Operation;
use chrono::Utc;
use common::{CASHIER_EMAIL, TestApp, pluck};
use http::{Method, StatusCode};
use serde_json::{Value, json};
use shared::models::Collection;

#[tokio::test]
async fn test_inventory_lists_all_items_with_search() {
    let app = TestApp::new();
    let token = app.login(CASHIER_EMAIL).await;

    let (status, body) = app.get("/api/inventory/items", &token).await;
    assert_eq!(status, StatusCode::OK);
    // 含不可售菜品，按名称排序
    assert_eq!(
        pluck(&body["data"]["items"], "nombre"),
        vec!["Agua", "Flan", "Hamburguesa", "Papas"]
    );

    let (_, body) = app.get("/api/inventory/items?search=%20HAM%20", &token).await;
    assert_eq!(pluck(&body["data"]["items"], "nombre"), vec!["Hamburguesa"]);

    let (_, body) = app.get("/api/inventory/items?search=queso", &token).await;
    assert_eq!(pluck(&body["data"]["items"], "nombre"), vec!["Hamburguesa"]);

    let (_, body) = app.get("/api/inventory/items?search=a&category=2", &token).await;
    assert_eq!(pluck(&body["data"]["items"], "nombre"), vec!["Agua"]);

    let (_, body) = app.get("/api/inventory/categories", &token).await;
    assert_eq!(pluck(&body["data"], "nombre"), vec!["Bebidas", "Comida"]);
}

#[tokio::test]
async fn test_create_category() {
    let app = TestApp::new();
    let token = app.login(CASHIER_EMAIL).await;

    let (status, body) = app
        .post("/api/inventory/categories", &token, json!({"nombre": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Nombre requerido");
    assert_eq!(app.memory.calls(Collection::Categories, Operation::Insert), 0);

    let (status, body) = app
        .post("/api/inventory/categories", &token, json!({"nombre": " Postres ", "icono": "cake"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Categoría creada");
    assert_eq!(body["data"]["nombre"], "Postres");
    assert_eq!(body["data"]["icono"], "cake");
}

#[tokio::test]
async fn test_create_item_validation() {
    let app = TestApp::new();
    let token = app.login(CASHIER_EMAIL).await;

    let (status, body) = app
        .post("/api/inventory/items", &token, json!({"nombre": "Flan", "precio": "2.75"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Completa nombre, precio y categoría");

    let (status, body) = app
        .post(
            "/api/inventory/items",
            &token,
            json!({"nombre": "Flan", "precio": "dos", "categoria_id": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Precio inválido");
    assert_eq!(app.memory.calls(Collection::MenuItems, Operation::Insert), 0);

    let (status, body) = app
        .post(
            "/api/inventory/items",
            &token,
            json!({"nombre": "Churros", "precio": 2.75, "categoria_id": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Producto creado");
    assert_eq!(body["data"]["precio"], 2.75);
    assert_eq!(body["data"]["disponible"], true);
}

#[tokio::test]
async fn test_update_and_delete_item() {
    let app = TestApp::new();
    let token = app.login(CASHIER_EMAIL).await;

    let (status, body) = app
        .call(
            Method::PATCH,
            "/api/inventory/items/10",
            Some(&token),
            Some(json!({"disponible": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["disponible"], false);

    // 菜单只显示可售菜品
    let (_, body) = app.get("/api/menu?category=1", &token).await;
    assert_eq!(pluck(&body["data"]["items"], "nombre"), vec!["Papas"]);

    let (status, _) = app
        .call(Method::PATCH, "/api/inventory/items/10", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::DELETE, "/api/inventory/items/11", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Producto eliminado");
    assert_eq!(app.memory.rows(Collection::MenuItems).len(), 3);
}

#[tokio::test]
async fn test_delete_category_failure() {
    let app = TestApp::new();
    let token = app.login(CASHIER_EMAIL).await;
    app.memory.fail(
        Collection::Categories,
        Operation::Delete,
        "violates foreign key constraint \"platos_categoria_id_fkey\"",
    );

    let (status, body) = app
        .call(Method::DELETE, "/api/inventory/categories/1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "No se pudo eliminar");
    assert!(
        body["details"]["description"]
            .as_str()
            .unwrap()
            .contains("foreign key")
    );
}

fn paid_order(total: f64, lines: Value) -> Value {
    json!({
        "mesero_id": "w1",
        "tipo_servicio": "local",
        "pagado": true,
        "total": total,
        "creado_at": Utc::now().to_rfc3339(),
        "items": lines
    })
}

#[tokio::test]
async fn test_daily_report() {
    let app = TestApp::new();
    app.memory.seed(
        Collection::Orders,
        [
            paid_order(5.0, json!([{"id": 12, "nombre": "Agua", "cantidad": 4, "precio": 1.25}])),
            paid_order(12.5, json!([{"id": 10, "nombre": "Hamburguesa", "cantidad": 2, "precio": 6.25}])),
            paid_order(
                7.25,
                json!([
                    {"id": 12, "nombre": "Agua", "cantidad": 1, "precio": 1.25},
                    {"id": 11, "nombre": "Papas", "cantidad": 3, "precio": 2.0}
                ]),
            ),
        ],
    );
    let token = app.login(CASHIER_EMAIL).await;

    let (status, body) = app.get("/api/reports/daily", &token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total"], 24.75);
    assert_eq!(body["data"]["order_count"], 3);
    assert_eq!(pluck(&body["data"]["by_category"], "name"), vec!["Comida", "Bebidas"]);
    assert_eq!(pluck(&body["data"]["by_category"], "revenue"), vec![18.5, 6.25]);
}
