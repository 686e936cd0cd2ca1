use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::payments::{ProcessPaymentRequest, ProcessPaymentResponse};

use super::CheckoutError;

/// Calls the payment capture function.
#[async_trait]
pub trait ChargeClient: Send + Sync {
    async fn process_payment(
        &self,
        request: &ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, CheckoutError>;
}

pub type SharedChargeClient = Arc<dyn ChargeClient>;

#[derive(Debug, Clone)]
pub struct HttpChargeClient {
    client: reqwest::Client,
    functions_url: String,
}

impl HttpChargeClient {
    pub fn new(client: reqwest::Client, functions_url: &str) -> Self {
        Self { client, functions_url: functions_url.trim_end_matches('/').to_owned() }
    }
}

#[async_trait]
impl ChargeClient for HttpChargeClient {
    async fn process_payment(
        &self,
        request: &ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/process-payment", self.functions_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<ProcessPaymentResponse>(&bytes) {
            Ok(body) => Ok(body),
            // Failure without the usual envelope, e.g. a proxy error page.
            Err(e) if !status.is_success() => {
                warn!("Payment function responded {status} without a JSON body: {e}");
                Ok(ProcessPaymentResponse {
                    success: false,
                    message: None,
                    sale_id: None,
                    charge_id: None,
                    error: None,
                })
            }
            Err(e) => Err(CheckoutError::InvalidResponse(e.to_string())),
        }
    }
}
