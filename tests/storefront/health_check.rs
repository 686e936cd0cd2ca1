use axum::http::StatusCode;
use serial_test::serial;

use crate::test_utils::{start_test_server, test_settings};

#[tokio::test]
#[serial]
async fn the_webserver_responds_to_a_simple_get_request() {
    let (server, _app_state, client) = start_test_server(test_settings()).await;

    let res = client.do_get("/healthcheck").await.expect("Health check should succeed.");

    server.abort();
    assert_eq!(res.status(), StatusCode::OK);
}
