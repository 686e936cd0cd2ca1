use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::test_utils::{
    ADMIN_EMAIL, json_body, sign_in_as_admin, start_test_server, test_settings,
};

#[tokio::test]
#[serial]
async fn admin_routes_require_a_session() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let anonymous = client.do_get("/admin/stats").await.expect("stats");
    let wrong = client
        .do_post("/auth/login", json!({ "email": ADMIN_EMAIL, "password": "wrong" }))
        .await
        .expect("login");
    let session = json_body(client.do_get("/auth/session").await.expect("session")).await;

    server.abort();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(session["authenticated"], false);
}

#[tokio::test]
#[serial]
async fn an_admin_manages_products_end_to_end() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;
    sign_in_as_admin(&client).await;

    let session = json_body(client.do_get("/auth/session").await.expect("session")).await;
    assert_eq!(session["isAdmin"], true);

    let created = client
        .do_post(
            "/admin/products",
            json!({
                "title": "Clínica Dental Pro",
                "category": "medico",
                "type": "landing",
                "price": 59.9,
                "image": "https://img.example.com/dental.jpg",
                "tags": ["dental", "salud"]
            }),
        )
        .await
        .expect("create");
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = json_body(created).await;
    let id = created["id"].as_str().expect("Expected a store id.").to_owned();
    assert_eq!(created["downloads"], 0);

    let storefront = json_body(client.do_get("/products").await.expect("list")).await;
    assert_eq!(storefront[0]["id"], id.as_str());
    assert_eq!(storefront.as_array().map(Vec::len), Some(15));

    let found = json_body(client.do_get("/admin/products?q=dental").await.expect("search")).await;
    assert_eq!(found["total"], 15);
    assert_eq!(found["products"].as_array().map(Vec::len), Some(1));

    let updated = client
        .do_put(&format!("/admin/products/{id}"), json!({ "price": 64.5 }))
        .await
        .expect("update");
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = json_body(updated).await;
    assert_eq!(updated["price"], 64.5);
    assert_eq!(updated["title"], "Clínica Dental Pro");

    let invalid = client
        .do_post(
            "/admin/products",
            json!({ "title": "", "category": "medico", "type": "landing", "price": 10.0, "image": "x.jpg" }),
        )
        .await
        .expect("create");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let read_only = client.do_delete("/admin/products/lp-001").await.expect("delete");
    assert_eq!(read_only.status(), StatusCode::BAD_REQUEST);

    let deleted = client.do_delete(&format!("/admin/products/{id}")).await.expect("delete");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let missing = client.do_get(&format!("/products/{id}")).await.expect("detail");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    server.abort();
}

#[tokio::test]
#[serial]
async fn dashboard_stats_cover_the_whole_catalog() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;
    sign_in_as_admin(&client).await;

    let stats = json_body(client.do_get("/admin/stats").await.expect("stats")).await;
    let sales = json_body(client.do_get("/admin/sales").await.expect("sales")).await;
    let upload = client.do_post("/admin/uploads?filename=a.png", "png").await.expect("upload");

    client.do_post("/auth/logout", "").await.expect("logout");
    let after_logout = client.do_get("/admin/stats").await.expect("stats");

    server.abort();
    assert_eq!(stats["totalProducts"], 14);
    assert_eq!(stats["topProducts"].as_array().map(Vec::len), Some(5));
    assert_eq!(sales["summary"]["totalSales"], 0);
    assert_eq!(upload.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn another_client_cannot_borrow_the_admin_session() {
    let (server, app_state, admin) = start_test_server(test_settings()).await;
    sign_in_as_admin(&admin).await;

    let url = format!("http://{}", app_state.settings.application.address());
    let anonymous = httpc_test::new_client(url).expect("Expected client to be created.");
    let session = json_body(anonymous.do_get("/auth/session").await.expect("session")).await;
    let stats = anonymous.do_get("/admin/stats").await.expect("stats");
    let logout = anonymous.do_post("/auth/logout", "").await.expect("logout");
    let admin_stats = admin.do_get("/admin/stats").await.expect("stats");
    let admin_session = json_body(admin.do_get("/auth/session").await.expect("session")).await;

    server.abort();
    assert_eq!(session["authenticated"], false);
    assert!(session.get("sessionId").is_none());
    assert_eq!(stats.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(logout.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(admin_stats.status(), StatusCode::OK);
    assert_eq!(admin_session["isAdmin"], true);
    assert!(admin_session.get("sessionId").is_none());
}
