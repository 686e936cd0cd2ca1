pub mod domain;
pub mod infra;
pub mod subsystems;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use domain::{
    auth::{
        AuthState, MemoryIdentityProvider, NewAccount, PgIdentityProvider, Role,
        SharedIdentityProvider,
    },
    catalog::{MemoryCatalogStore, PgCatalogStore, ProductState, SharedStore, demo_catalog},
    email::{Branding, ReceiptMailer, ResendClient},
    media::MediaUploader,
    notifier::{SharedNotifier, TracingNotifier},
    payments::{CulqiGateway, PaymentProcessor},
    preferences::{Favorites, FileLocalStore, MemoryLocalStore, SharedLocalStore, ThemeState},
};
use infra::{Cli, DatabaseSettings, PaymentSettings, Settings};
use sqlx::{PgPool, postgres::PgPoolOptions};
use subsystems::{CatalogListener, WebServer};
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemBuilder, Toplevel};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Settings,
    pub payments: PaymentSettings,
    /// `None` when serving from the in-memory store.
    pub pool: Option<PgPool>,
    pub store: SharedStore,
    pub notifier: SharedNotifier,
    pub products: ProductState,
    pub favorites: Favorites,
    pub theme: ThemeState,
    pub auth: AuthState,
    pub processor: PaymentProcessor,
    pub mailer: ReceiptMailer,
    pub uploader: MediaUploader,
}

pub fn build_subsystems(state: AppState) -> Toplevel {
    let catalog_listener = CatalogListener::new(state.products.clone());
    let webserver = WebServer::new(state);

    // Setup and execute subsystem tree
    Toplevel::new(async |s| {
        s.start(SubsystemBuilder::new(
            "CatalogListener",
            catalog_listener.into_subsystem(),
        ));
        s.start(SubsystemBuilder::new(
            "Webserver",
            webserver.into_subsystem(),
        ));
    })
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let pool = state.pool.clone();
    let result = build_subsystems(state)
        .catch_signals()
        .handle_shutdown_requests(Duration::from_millis(2000))
        .await
        .map_err(Into::into);
    if let Some(pool) = pool {
        pool.close().await;
    }
    result
}

pub fn configure_tracing(settings: &Settings) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(
        settings.application.logs_directory.clone(),
        "storefront_server.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(non_blocking)
        .init();
    _guard
}

pub async fn construct_app_state(settings: Settings, cli: &Cli) -> Result<AppState, anyhow::Error> {
    let notifier: SharedNotifier = Arc::new(TracingNotifier);

    let (pool, store, identity, storage): (
        Option<PgPool>,
        SharedStore,
        SharedIdentityProvider,
        SharedLocalStore,
    ) = if cli.in_memory {
        info!("Serving from the in-memory store. Nothing will be persisted.");
        (
            None,
            Arc::new(MemoryCatalogStore::new()),
            Arc::new(MemoryIdentityProvider::default()),
            Arc::new(MemoryLocalStore::default()),
        )
    } else {
        let pool = construct_db_pool(&settings.database).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations.")?;
        (
            Some(pool.clone()),
            Arc::new(PgCatalogStore::new(pool.clone())),
            Arc::new(PgIdentityProvider::new(pool)),
            Arc::new(FileLocalStore::new(&settings.application.state_directory)),
        )
    };

    if cli.seed_admin {
        seed_admin(&settings, identity.as_ref()).await?;
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client.")?;

    let payments = settings.payments.clone();
    let mailer = ReceiptMailer::new(
        Arc::new(ResendClient::new(
            client.clone(),
            &settings.email.api_base_url,
            settings.email.api_key.clone(),
        )),
        &settings.email.from_address,
        Branding {
            brand_name: settings.email.brand_name.clone(),
            currency_symbol: payments.currency_symbol.clone(),
        },
    );
    let gateway = CulqiGateway::new(
        client.clone(),
        &payments.api_base_url,
        payments.secret_key.clone(),
        &payments.provider,
    );
    let processor =
        PaymentProcessor::new(store.clone(), Arc::new(gateway), mailer.clone(), &payments.currency);
    let uploader = MediaUploader::new(
        client,
        &settings.media.api_base_url,
        settings.media.cloud_name.clone(),
        settings.media.upload_preset.clone(),
        notifier.clone(),
    );

    let fallback = demo_catalog().context("Demo catalog is not valid JSON.")?;
    let products = ProductState::new(store.clone(), notifier.clone(), fallback);
    if let Err(e) = products.refresh().await {
        warn!("Serving the demo catalog only. Initial product load failed: {e}");
    }

    let favorites = Favorites::load(storage.clone()).await;
    let theme = ThemeState::load(storage.clone()).await;
    let auth = AuthState::load(identity, storage, notifier.clone()).await;

    Ok(AppState {
        settings,
        payments,
        pool,
        store,
        notifier,
        products,
        favorites,
        theme,
        auth,
        processor,
        mailer,
        uploader,
    })
}

async fn seed_admin(
    settings: &Settings,
    identity: &dyn domain::auth::IdentityProvider,
) -> Result<(), anyhow::Error> {
    let Some(seed) = &settings.auth.seed_admin else {
        warn!("--seed-admin given but no auth.seed_admin settings are configured.");
        return Ok(());
    };
    let account = NewAccount {
        email: seed.email.clone(),
        name: seed.name.clone(),
        password: seed.password.clone(),
        role: Role::Admin,
    };
    let user = identity
        .upsert_account(&account)
        .await
        .with_context(|| format!("Could not seed admin account {}", seed.email))?;
    info!("Admin account {} is ready.", user.email);
    Ok(())
}

pub async fn construct_db_pool(settings: &DatabaseSettings) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_with(settings.with_db_name())
        .await
        .context("Failed to connect to Postgres database.\n1. Check database is running.\n2. Check Postgres database settings in configuration file(s).")
}
