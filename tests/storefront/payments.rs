use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;
use storefront_server::domain::checkout::{
    ChannelWidget, CheckoutOptions, CheckoutOrchestrator, CheckoutOutcome, CheckoutState,
    HttpChargeClient, WidgetRequest, WidgetResult,
};

use crate::test_utils::{
    assert_until_eq, json_body, sign_in_as_admin, start_mock_gateway, start_test_server,
    test_settings,
};

#[tokio::test]
#[serial]
async fn payment_without_a_gateway_key_is_refused() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let res = client
        .do_post(
            "/process-payment",
            json!({ "token": "tkn_test", "productId": "lp-001", "email": "buyer@example.com", "amount": 49.99 }),
        )
        .await
        .expect("payment");
    let status = res.status();
    let body = json_body(res).await;

    server.abort();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Llave secreta de la pasarela de pagos no configurada");
}

#[tokio::test]
#[serial]
async fn missing_parameters_are_reported() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let res = client
        .do_post("/process-payment", json!({ "productId": "lp-001" }))
        .await
        .expect("payment");
    let status = res.status();
    let body = json_body(res).await;

    server.abort();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Faltan parámetros requeridos");
}

#[tokio::test]
#[serial]
async fn a_captured_payment_is_recorded_as_a_sale() {
    let mut settings = test_settings();
    settings.payments.api_base_url = start_mock_gateway().await;
    settings.payments.secret_key = Some("sk_test_storefront".to_owned());
    let (server, _app_state, client) = start_test_server(settings).await;
    sign_in_as_admin(&client).await;

    let product = json_body(
        client
            .do_post(
                "/admin/products",
                json!({
                    "title": "Restaurante Gourmet",
                    "category": "restaurant",
                    "type": "templates",
                    "price": 25.5,
                    "image": "https://img.example.com/gourmet.jpg",
                    "download_url": "https://files.example.com/gourmet.zip"
                }),
            )
            .await
            .expect("create"),
    )
    .await;
    let product_id = product["id"].as_str().expect("Expected a store id.").to_owned();

    let res = client
        .do_post(
            "/process-payment",
            json!({ "token": "tkn_test", "productId": product_id, "email": "buyer@example.com", "amount": 25.5 }),
        )
        .await
        .expect("payment");
    let status = res.status();
    let body = json_body(res).await;
    assert_eq!(status, StatusCode::OK, "unexpected response {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["chargeId"], "chr_test_storefront");

    let client = &client;
    assert_until_eq(
        || async move {
            client
                .do_get("/admin/sales")
                .await
                .map(|res| res.json_body().map(|body| body["summary"]["totalSales"].clone()))
                .map(|total| total.unwrap_or_default())
        },
        json!(1),
        "waiting for the sale",
    )
    .await;

    let sales = json_body(client.do_get("/admin/sales").await.expect("sales")).await;
    server.abort();
    assert_eq!(sales["sales"][0]["buyerEmail"], "buyer@example.com");
    assert_eq!(sales["sales"][0]["productData"]["title"], "Restaurante Gourmet");
    assert_eq!(sales["summary"]["totalRevenue"], 25.5);
    assert_eq!(sales["summary"]["todaySales"], 1);
}

#[tokio::test]
#[serial]
async fn the_checkout_flow_pays_through_the_payment_function() {
    let mut settings = test_settings();
    settings.payments.api_base_url = start_mock_gateway().await;
    settings.payments.secret_key = Some("sk_test_storefront".to_owned());
    let (server, app_state, client) = start_test_server(settings).await;
    sign_in_as_admin(&client).await;

    let created = json_body(
        client
            .do_post(
                "/admin/products",
                json!({
                    "title": "Veterinaria Feliz",
                    "category": "veterinaria",
                    "type": "landing",
                    "price": 54.99,
                    "image": "https://img.example.com/vet.jpg"
                }),
            )
            .await
            .expect("create"),
    )
    .await;
    let product_id = created["id"].as_str().expect("Expected a store id.");
    let product = app_state.products.get(product_id).await.expect("Expected the new product.");

    // Stands in for the buyer completing the hosted widget.
    let (widget, mut requests) = ChannelWidget::new(4);
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            if let WidgetRequest::Open { completion, .. } = request {
                completion.resolve(WidgetResult::Token("tkn_test".to_owned()));
            }
        }
    });

    let functions_url = format!("http://{}", app_state.settings.application.address());
    let mut checkout = CheckoutOrchestrator::new(
        product,
        app_state.payments.clone(),
        CheckoutOptions { charge_timeout: Duration::from_secs(10), success_display: Duration::ZERO },
        Arc::new(widget),
        Arc::new(HttpChargeClient::new(reqwest::Client::new(), &functions_url)),
        app_state.notifier.clone(),
    );

    checkout.start().await.expect("Expected the widget to load.");
    let outcome = checkout
        .pay("buyer@example.com", |_token| {})
        .await
        .expect("Expected the attempt to complete.");
    let sales = json_body(client.do_get("/admin/sales").await.expect("sales")).await;

    server.abort();
    assert!(
        matches!(&outcome, CheckoutOutcome::Succeeded { charge_id: Some(id), .. } if id == "chr_test_storefront"),
        "unexpected outcome {outcome:?}"
    );
    assert_eq!(checkout.state(), &CheckoutState::Succeeded);
    assert_eq!(sales["summary"]["totalSales"], 1);
}
