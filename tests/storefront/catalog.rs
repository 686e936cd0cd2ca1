use axum::http::StatusCode;
use serde_json::Value;
use serial_test::serial;

use crate::test_utils::{json_body, start_test_server, test_settings};

fn ids(products: &Value) -> Vec<String> {
    products
        .as_array()
        .expect("Expected a product list.")
        .iter()
        .map(|p| p["id"].as_str().expect("Expected a product id.").to_owned())
        .collect()
}

#[tokio::test]
#[serial]
async fn the_demo_catalog_is_served_when_the_store_is_empty() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let all = json_body(client.do_get("/products").await.expect("list")).await;
    let medical = json_body(client.do_get("/products?category=medico").await.expect("filter")).await;
    let cheap = json_body(
        client
            .do_get("/products?type=landing&max_price=50&sort=price-asc")
            .await
            .expect("filter"),
    )
    .await;

    server.abort();
    assert_eq!(ids(&all).len(), 14);
    assert_eq!(ids(&medical), vec!["lp-003", "fp-001", "ps-001"]);
    assert_eq!(ids(&cheap), vec!["lp-008", "lp-005", "lp-001"]);
}

#[tokio::test]
#[serial]
async fn product_detail_and_view_counting() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let detail = client.do_get("/products/lp-003").await.expect("detail");
    let missing = client.do_get("/products/does-not-exist").await.expect("detail");
    let first = json_body(client.do_post("/products/lp-003/views", "").await.expect("views")).await;
    let second = json_body(client.do_post("/products/lp-003/views", "").await.expect("views")).await;
    let after = json_body(client.do_get("/products/lp-003").await.expect("detail")).await;

    server.abort();
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(first["views"], 1);
    assert_eq!(second["views"], 2);
    assert_eq!(after["views"], 2);
}

#[tokio::test]
#[serial]
async fn favorites_and_theme_toggle() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let added = json_body(client.do_post("/favorites/lp-001", "").await.expect("toggle")).await;
    client.do_post("/favorites/fp-002", "").await.expect("toggle");
    let listed = json_body(client.do_get("/favorites").await.expect("favorites")).await;
    let removed = json_body(client.do_post("/favorites/lp-001", "").await.expect("toggle")).await;

    let theme = json_body(client.do_get("/theme").await.expect("theme")).await;
    let toggled = json_body(client.do_post("/theme/toggle", "").await.expect("toggle")).await;

    server.abort();
    assert_eq!(added["isFavorite"], true);
    assert_eq!(listed, serde_json::json!(["fp-002", "lp-001"]));
    assert_eq!(removed["isFavorite"], false);
    assert_eq!(theme["theme"], "light");
    assert_eq!(toggled["theme"], "dark");
}

#[tokio::test]
#[serial]
async fn the_widget_is_configured_from_the_product_price() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let config =
        json_body(client.do_get("/checkout/lp-001/widget-config").await.expect("config")).await;
    let missing = client.do_get("/checkout/nope/widget-config").await.expect("config");

    server.abort();
    assert_eq!(config["publicKey"], "pk_test_storefront");
    assert_eq!(config["settings"]["amount"], 4999);
    assert_eq!(config["settings"]["currency"], "PEN");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
