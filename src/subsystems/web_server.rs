use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use futures::FutureExt;
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    AppState,
    domain::{admin, auth, catalog, checkout, email, media, payments, preferences},
    infra::ClientError,
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Storefront
        .route("/products", get(catalog::list_products_endpoint))
        .route("/products/{id}", get(catalog::product_endpoint))
        .route("/products/{id}/views", post(catalog::increment_views_endpoint))
        .route("/favorites", get(preferences::favorites_endpoint))
        .route("/favorites/{id}", post(preferences::toggle_favorite_endpoint))
        .route("/theme", get(preferences::theme_endpoint))
        .route("/theme/toggle", post(preferences::toggle_theme_endpoint))
        .route("/checkout/{id}/widget-config", get(checkout::widget_config_endpoint))
        // Session
        .route("/auth/login", post(auth::login_endpoint))
        .route("/auth/logout", post(auth::logout_endpoint))
        .route("/auth/session", get(auth::session_endpoint))
        // Admin
        .route(
            "/admin/products",
            get(admin::search_products_endpoint).post(admin::create_product_endpoint),
        )
        .route(
            "/admin/products/{id}",
            put(admin::update_product_endpoint).delete(admin::delete_product_endpoint),
        )
        .route("/admin/sales", get(admin::sales_endpoint))
        .route("/admin/stats", get(admin::stats_endpoint))
        .route(
            "/admin/uploads",
            post(media::upload_endpoint).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Functions
        .route("/process-payment", post(payments::process_payment_endpoint))
        .route("/send-product-email", post(email::send_product_email_endpoint))
        .route("/healthcheck", get(health_check_endpoint))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for WebServer {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        let address = self.state.settings.application.address();
        let socket_addr: SocketAddr = address.parse()
            .inspect_err(|e| error!("Could not parse server address {address}.\nCheck application host and port in configuration settings.\nFailed with {e}"))?;

        let router = router(self.state);

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .inspect_err(|e| {
                error!("Could not bind socket address {socket_addr}. Failed with {e}")
            })?;

        info!("Web server starting on http://{socket_addr}");
        select!(
            result = axum::serve(listener, router.into_make_service()).into_future().map(|result| result.map_err(anyhow::Error::new)) => {
                error!("Web server completed with {result:?}");
            }
            _ = subsys.on_shutdown_requested() => {
                info!("Web server shutdown");
            }
        );
        Ok(())
    }
}

pub async fn health_check_endpoint() -> Result<Json<String>, ClientError> {
    Ok(Json("Ok".to_owned()))
}
