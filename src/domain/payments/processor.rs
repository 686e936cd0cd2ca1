//! Payment capture slice: `POST /process-payment`.
//!
//! Strictly sequential: validate, look up the product, charge its stored price, record the sale,
//! then send the receipt. Once the sale is recorded nothing that follows can fail the request.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};
use validator::{Validate, ValidationErrors};

use crate::domain::{
    catalog::{NewSale, SALE_STATUS_COMPLETED, SaleId, SharedStore},
    email::{ReceiptMailer, ReceiptProduct},
    validation::{email_address, has_code, not_blank, positive_amount},
};

use super::{ChargeRequest, PaymentError, SharedGateway, minor_units};

//------------------------- Web API ----------------------------

/// Absent fields deserialize as empty/zero and are reported as missing parameters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessPaymentRequest {
    #[validate(custom(function = "not_blank"))]
    pub token: String,
    #[validate(custom(function = "not_blank"))]
    pub product_id: String,
    #[validate(custom(function = "email_address"))]
    pub email: String,
    /// Display hint only. The product's stored price is what gets charged.
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn process_payment_endpoint(
    State(processor): State<PaymentProcessor>,
    Json(request): Json<ProcessPaymentRequest>,
) -> (StatusCode, Json<ProcessPaymentResponse>) {
    match processor.process(&request).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(ProcessPaymentResponse {
                success: true,
                message: Some("Pago procesado exitosamente".to_owned()),
                sale_id: Some(receipt.sale_id.to_string()),
                charge_id: Some(receipt.charge_id),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Error en process-payment: {e:?}");
            (
                StatusCode::BAD_REQUEST,
                Json(ProcessPaymentResponse {
                    success: false,
                    message: None,
                    sale_id: None,
                    charge_id: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

//------------------------- Processor ---------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub sale_id: SaleId,
    pub charge_id: String,
}

#[derive(Clone)]
pub struct PaymentProcessor {
    store: SharedStore,
    gateway: SharedGateway,
    mailer: ReceiptMailer,
    currency: String,
}

impl PaymentProcessor {
    pub fn new(
        store: SharedStore,
        gateway: SharedGateway,
        mailer: ReceiptMailer,
        currency: &str,
    ) -> Self {
        Self { store, gateway, mailer, currency: currency.to_owned() }
    }

    #[instrument(skip_all, fields(product_id = %request.product_id))]
    pub async fn process(
        &self,
        request: &ProcessPaymentRequest,
    ) -> Result<PaymentReceipt, PaymentError> {
        request.validate().map_err(PaymentError::from)?;
        if !self.gateway.is_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let product = self
            .store
            .find_product(&request.product_id)
            .await
            .map_err(PaymentError::Store)?
            .ok_or(PaymentError::ProductNotFound)?;
        if product.price != request.amount {
            warn!(
                "Client amount {} differs from the stored price {}, charging the stored price.",
                request.amount, product.price
            );
        }
        let amount = minor_units(product.price)
            .filter(|minor| *minor > 0)
            .ok_or(PaymentError::InvalidAmount)?;

        let charge = self
            .gateway
            .charge(&ChargeRequest {
                amount,
                currency_code: self.currency.clone(),
                email: request.email.clone(),
                source_id: request.token.clone(),
            })
            .await?;

        let sale = self
            .store
            .insert_sale(&NewSale {
                product_id: product.id.clone(),
                buyer_email: request.email.clone(),
                amount: product.price,
                currency: self.currency.clone(),
                payment_provider: self.gateway.provider().to_owned(),
                payment_id: charge.id.clone(),
                payment_status: SALE_STATUS_COMPLETED.to_owned(),
                product_data: product.clone(),
            })
            .await
            .map_err(|e| {
                error!("Charge {} captured but the sale was not recorded: {e}", charge.id);
                PaymentError::SaleNotRecorded(e)
            })?;
        info!("Sale {} recorded for charge {}.", sale.id, charge.id);

        let receipt_product = ReceiptProduct::from(&product);
        if let Err(e) = self
            .mailer
            .send_receipt(&request.email, &receipt_product, &sale.id.to_string())
            .await
        {
            warn!("Receipt for sale {} not sent, the sale stands: {e}", sale.id);
        }

        Ok(PaymentReceipt { sale_id: sale.id, charge_id: charge.id })
    }
}

/// Missing fields win over malformed ones.
impl From<ValidationErrors> for PaymentError {
    fn from(errors: ValidationErrors) -> Self {
        if has_code(&errors, "required") {
            PaymentError::MissingParameters
        } else if errors.field_errors().contains_key("email") {
            PaymentError::InvalidEmail
        } else {
            PaymentError::InvalidAmount
        }
    }
}

//-------------------------- Tests -------------------------------
