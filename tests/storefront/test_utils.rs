use std::{future::Future, time::Duration};

use axum::{Json, Router, routing::post};
use httpc_test::Client;
use serde_json::{Value, json};
use storefront_server::{
    AppState, construct_app_state,
    infra::{Cli, SeedAdmin, Settings, get_config_settings},
    start_server,
};
use tokio::task::JoinHandle;

pub const ADMIN_EMAIL: &str = "admin@tienda.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Asserts that a function returns an expected value or retries until it does.
/// Retries every 500ms if the values do not match.
/// Will fail immediately on an error or after 60 retries (30 seconds).
pub async fn assert_until_eq<F, Fut, T, E>(f: F, expected_value: T, label: &str)
where
    F: Fn() -> Fut,
    E: std::fmt::Debug,
    Fut: Future<Output = Result<T, E>>,
    T: PartialEq + std::fmt::Debug,
{
    let delay_ms = 500;
    let max_times = 60;
    let mut times: usize = 0;
    let mut result: T = f().await.unwrap();
    while times < max_times {
        times += 1;
        if result == expected_value {
            break;
        } else {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            println!("Retry #{times} {label}");
            result = f().await.unwrap();
        }
    }
    assert_eq!(result, expected_value);
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("Expected a free local port.")
        .port()
}

/// Settings for an in-memory server on a free port, with a seeded admin and no external services.
pub fn test_settings() -> Settings {
    let mut settings = get_config_settings().expect("Could not read application configuration.");
    settings.application.host = "127.0.0.1".to_owned();
    settings.application.port = free_port();
    settings.payments.secret_key = None;
    settings.payments.public_key = Some("pk_test_storefront".to_owned());
    settings.email.api_key = None;
    settings.media.cloud_name = None;
    settings.media.upload_preset = None;
    settings.auth.seed_admin = Some(SeedAdmin {
        email: ADMIN_EMAIL.to_owned(),
        name: "Administrador".to_owned(),
        password: ADMIN_PASSWORD.to_owned(),
    });
    settings
}

pub async fn start_test_server(
    settings: Settings,
) -> (JoinHandle<Result<(), anyhow::Error>>, AppState, Client) {
    let cli = Cli { in_memory: true, seed_admin: true };
    let app_state = construct_app_state(settings, &cli)
        .await
        .expect("Expected AppState to be created.");
    let server_handle = tokio::task::spawn(start_server(app_state.clone()));

    let url = format!("http://{}", app_state.settings.application.address());
    let client = httpc_test::new_client(url).expect("Expected client to be created.");
    let poller = &client;
    assert_until_eq(
        || async move {
            // Connection refused until the listener is bound.
            let status = poller.do_get("/healthcheck").await.map(|res| res.status().as_u16());
            Ok::<_, std::convert::Infallible>(status.unwrap_or_default())
        },
        200,
        "waiting for web server",
    )
    .await;

    (server_handle, app_state, client)
}

/// Signs the client in as the seeded admin. The session cookie is kept by the client.
pub async fn sign_in_as_admin(client: &Client) {
    let res = client
        .do_post("/auth/login", json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .await
        .expect("Login request should be sent.");
    assert_eq!(res.status().as_u16(), 200, "admin login should succeed");
}

pub async fn json_body(res: httpc_test::Response) -> Value {
    res.json_body().expect("Expected a JSON body.")
}

/// Starts a stand-in for the payment gateway's charge API that approves every charge.
pub async fn start_mock_gateway() -> String {
    let router = Router::new().route(
        "/v2/charges",
        post(|Json(charge): Json<Value>| async move {
            Json(json!({
                "object": "charge",
                "id": "chr_test_storefront",
                "amount": charge["amount"],
                "outcome": { "type": "venta_exitosa" }
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Expected mock gateway to bind.");
    let address = listener.local_addr().expect("Expected mock gateway address.");
    tokio::spawn(async move { axum::serve(listener, router).await });
    format!("http://{address}")
}
