use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use tracing::{error, info};

use super::PaymentError;

pub const SUCCESSFUL_SALE: &str = "venta_exitosa";

/// Integer minor units (cents) for a decimal amount, rounded half away from zero.
pub fn minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChargeRequest {
    pub amount: i64,
    pub currency_code: String,
    pub email: String,
    pub source_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub id: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider name recorded on sales.
    fn provider(&self) -> &str;

    fn is_configured(&self) -> bool;

    async fn charge(&self, request: &ChargeRequest) -> Result<Charge, PaymentError>;
}

pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Charge API client (`POST {base}/v2/charges`, bearer secret key).
#[derive(Debug, Clone)]
pub struct CulqiGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
    provider: String,
}

impl CulqiGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        secret_key: Option<String>,
        provider: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            secret_key: secret_key.filter(|key| !key.is_empty()),
            provider: provider.to_owned(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ChargeResponse {
    id: Option<String>,
    object: Option<String>,
    user_message: Option<String>,
    outcome: Option<ChargeOutcome>,
}

#[derive(Debug, serde::Deserialize)]
struct ChargeOutcome {
    #[serde(rename = "type")]
    outcome_type: Option<String>,
}

#[async_trait]
impl PaymentGateway for CulqiGateway {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<Charge, PaymentError> {
        let secret_key = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/v2/charges", self.base_url))
            .bearer_auth(secret_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body: ChargeResponse = response.json().await?;

        if !status.is_success() || body.object.as_deref() == Some("error") {
            error!("Charge rejected with {status}: {body:?}");
            return Err(PaymentError::Declined(
                body.user_message.unwrap_or_else(|| "Error al procesar el pago".to_owned()),
            ));
        }

        let successful = body
            .outcome
            .as_ref()
            .and_then(|o| o.outcome_type.as_deref())
            == Some(SUCCESSFUL_SALE);
        match body.id {
            Some(id) if successful => {
                info!("Charge {id} captured.");
                Ok(Charge { id })
            }
            _ => {
                error!("Charge not successful: {body:?}");
                Err(PaymentError::NotSuccessful)
            }
        }
    }
}
