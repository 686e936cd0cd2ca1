use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use futures::StreamExt;
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tracing::{error, info, warn};

use crate::domain::catalog::ProductState;

/// Keeps the in-memory catalog in step with the store. Any insert, update or delete on the
/// products table, by this process or another, triggers a full refresh.
pub struct CatalogListener {
    products: ProductState,
}

impl CatalogListener {
    pub fn new(products: ProductState) -> Self {
        Self { products }
    }

    /// Log and re-subscribe if the change feed fails or closes.
    /// Uses exponential backoff if the problem persists.
    async fn listen(&self) -> Result<(), anyhow::Error> {
        (|| async { self.try_listen().await })
            .retry(
                ExponentialBuilder::default()
                    .with_max_delay(Duration::from_secs(30))
                    .without_max_times(),
            )
            .sleep(tokio::time::sleep)
            .notify(|err, dur| {
                error!("Re-subscribing to catalog changes due to: {err:?} after {dur:?}")
            })
            .await
    }

    async fn try_listen(&self) -> Result<(), anyhow::Error> {
        let mut changes = self.products.store().subscribe().await?;

        // Changes made while we were not subscribed are only visible through a reload.
        if let Err(e) = self.products.refresh().await {
            warn!("Catalog reload after subscribing failed: {e}");
        }

        while let Some(change) = changes.next().await {
            let change = change?;
            if change.affects_products() {
                info!("Catalog change received: {change:?}");
                if let Err(e) = self.products.refresh().await {
                    warn!("Catalog reload failed: {e}");
                }
            }
        }

        Err(anyhow!("Catalog change feed closed."))
    }
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for CatalogListener {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        info!("Catalog listener starting.");
        select!(
            result = self.listen() => {
                error!("Catalog listener completed with {result:?}");
            }
            _ = subsys.on_shutdown_requested() => {
                info!("Catalog listener shutdown.");
            }
        );
        Ok(())
    }
}

//---------------------------- Tests -----------------------------
