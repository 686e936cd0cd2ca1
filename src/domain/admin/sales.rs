//! Admin sales slice: every sale, newest first, with the summary cards.

use axum::{Json, extract::State};
use jiff::{Zoned, tz::TimeZone};
use rust_decimal::Decimal;
use tracing::error;

use crate::{
    domain::{
        auth::AdminSession,
        catalog::{Sale, SharedStore},
        notifier::SharedNotifier,
    },
    infra::ClientError,
};

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_sales: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub today_sales: usize,
    pub month_sales: usize,
}

impl SalesSummary {
    /// "Today" and "this month" are calendar periods in the time zone of `now`.
    pub fn compute(sales: &[Sale], now: &Zoned) -> Result<Self, jiff::Error> {
        let today = now.start_of_day()?.timestamp();
        let month = now.first_of_month()?.start_of_day()?.timestamp();
        Ok(Self {
            total_sales: sales.len(),
            total_revenue: sales.iter().map(|s| s.amount).sum(),
            today_sales: sales.iter().filter(|s| s.created_at >= today).count(),
            month_sales: sales.iter().filter(|s| s.created_at >= month).count(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SalesResponse {
    pub sales: Vec<Sale>,
    pub summary: SalesSummary,
}

pub async fn sales_endpoint(
    AdminSession(_admin): AdminSession,
    State(store): State<SharedStore>,
    State(notifier): State<SharedNotifier>,
) -> Result<Json<SalesResponse>, ClientError> {
    let sales = store.list_sales().await.inspect_err(|e| {
        error!("Error al cargar ventas: {e}");
        notifier.error("Error al cargar las ventas");
    })?;
    let now = Zoned::now().with_time_zone(TimeZone::system());
    let summary = SalesSummary::compute(&sales, &now)
        .map_err(|e| ClientError::Internal(anyhow::Error::new(e)))?;
    Ok(Json(SalesResponse { sales, summary }))
}
