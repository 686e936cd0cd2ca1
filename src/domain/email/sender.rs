use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::EmailError;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { id: Option<String> },
    /// No API key configured, nothing left the process.
    Simulated,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<SendOutcome, EmailError>;
}

pub type SharedEmailSender = Arc<dyn EmailSender>;

/// Transactional email API client (`POST {base}/emails`).
#[derive(Debug, Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ResendClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

#[derive(serde::Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<SendOutcome, EmailError> {
        let Some(api_key) = &self.api_key else {
            warn!("Email API key not configured, simulating send to {:?}", email.to);
            return Ok(SendOutcome::Simulated);
        };

        info!("Sending email to {:?}", email.to);
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Email API responded {status}: {body}");
            return Err(EmailError::Rejected(body));
        }
        let body: SendResponse = response.json().await?;
        info!("Email sent with id {:?}", body.id);
        Ok(SendOutcome::Sent { id: body.id })
    }
}
