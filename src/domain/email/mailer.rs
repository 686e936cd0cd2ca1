//! Receipt email slice: `POST /send-product-email` and the mailer the payment flow reuses.

use axum::{Json, extract::State, http::StatusCode};
use tracing::{error, instrument};

use crate::domain::validation::is_valid_email;

use super::{
    Branding, EmailError, OutgoingEmail, ReceiptProduct, SendOutcome, SharedEmailSender,
    receipt_subject, render_receipt,
};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceiptPayload {
    pub email: String,
    pub product: ReceiptProduct,
    pub sale_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceiptResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn send_product_email_endpoint(
    State(mailer): State<ReceiptMailer>,
    Json(payload): Json<SendReceiptPayload>,
) -> (StatusCode, Json<SendReceiptResponse>) {
    match mailer.send_receipt(&payload.email, &payload.product, &payload.sale_id).await {
        Ok(SendOutcome::Sent { id }) => (
            StatusCode::OK,
            Json(SendReceiptResponse {
                success: true,
                message: Some("Email enviado exitosamente".to_owned()),
                email_id: id,
                error: None,
            }),
        ),
        Ok(SendOutcome::Simulated) => (
            StatusCode::OK,
            Json(SendReceiptResponse {
                success: true,
                message: Some(
                    "Email simulado (configura email.api_key para envío real)".to_owned(),
                ),
                email_id: None,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SendReceiptResponse {
                success: false,
                message: None,
                email_id: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

//-------------------------- Mailer -----------------------------

#[derive(Clone)]
pub struct ReceiptMailer {
    sender: SharedEmailSender,
    from_address: String,
    branding: Branding,
}

impl ReceiptMailer {
    pub fn new(sender: SharedEmailSender, from_address: &str, branding: Branding) -> Self {
        Self { sender, from_address: from_address.to_owned(), branding }
    }

    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn send_receipt(
        &self,
        email: &str,
        product: &ReceiptProduct,
        sale_id: &str,
    ) -> Result<SendOutcome, EmailError> {
        if !is_valid_email(email) {
            return Err(EmailError::InvalidRecipient(email.to_owned()));
        }
        let message = OutgoingEmail {
            from: self.from_address.clone(),
            to: vec![email.to_owned()],
            subject: receipt_subject(product),
            html: render_receipt(product, sale_id, &self.branding),
        };
        self.sender
            .send(&message)
            .await
            .inspect_err(|e| error!("Error al enviar email: {e}"))
    }
}
