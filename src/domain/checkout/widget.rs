//! Hosted payment widget: its configuration, the request-scoped completion handle and the
//! `GET /checkout/{product_id}/widget-config` endpoint.

use axum::{
    Json,
    extract::{Path, State},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{
        catalog::{Product, ProductState},
        payments::minor_units,
    },
    infra::{ClientError, PaymentSettings},
};

use super::CheckoutError;

//------------------------- Web API ----------------------------

pub async fn widget_config_endpoint(
    State(products): State<ProductState>,
    State(payments): State<PaymentSettings>,
    Path(product_id): Path<String>,
) -> Result<Json<WidgetConfig>, ClientError> {
    let product = products
        .get(&product_id)
        .await
        .ok_or_else(|| ClientError::NotFound(format!("Product {product_id} does not exist.")))?;
    Ok(Json(WidgetConfig::for_product(&payments, &product)?))
}

//------------------------- Config ------------------------------

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub public_key: String,
    pub settings: WidgetSettings,
    pub options: WidgetOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WidgetSettings {
    pub title: String,
    pub currency: String,
    /// Minor units.
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    pub lang: String,
    pub installments: bool,
    pub payment_methods: PaymentMethods,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Card and the local wallet are enabled, bank and agent methods are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethods {
    pub tarjeta: bool,
    pub yape: bool,
    pub billetera: bool,
    pub banca_movil: bool,
    pub agente: bool,
    pub cuotealo: bool,
}

impl Default for PaymentMethods {
    fn default() -> Self {
        Self {
            tarjeta: true,
            yape: true,
            billetera: false,
            banca_movil: false,
            agente: false,
            cuotealo: false,
        }
    }
}

impl WidgetConfig {
    pub fn for_product(
        payments: &PaymentSettings,
        product: &Product,
    ) -> Result<Self, CheckoutError> {
        let public_key = payments
            .public_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CheckoutError::Configuration("Llave pública de Culqi no encontrada".to_owned())
            })?;
        Ok(Self {
            public_key,
            settings: WidgetSettings {
                title: payments.widget_title.clone(),
                currency: payments.currency.clone(),
                amount: widget_amount(product.price)?,
                description: None,
            },
            options: WidgetOptions {
                lang: payments.lang.clone(),
                installments: false,
                payment_methods: PaymentMethods::default(),
                email: None,
            },
        })
    }
}

fn widget_amount(price: Decimal) -> Result<i64, CheckoutError> {
    minor_units(price).ok_or_else(|| CheckoutError::Widget(format!("price {price} out of range")))
}

//------------------------ Completion ---------------------------

/// Immutable snapshot of the form at the moment the buyer pressed pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutAttempt {
    pub email: String,
    pub product_id: String,
    pub product_title: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetResult {
    Token(String),
    /// The provider's user-facing message.
    Error(String),
}

/// One-shot handle that delivers the widget result to exactly one checkout attempt.
#[derive(Debug)]
pub struct WidgetCompletion(oneshot::Sender<WidgetResult>);

impl WidgetCompletion {
    pub fn channel() -> (Self, oneshot::Receiver<WidgetResult>) {
        let (sender, receiver) = oneshot::channel();
        (Self(sender), receiver)
    }

    /// Consumes the handle. Returns false if the attempt was abandoned.
    pub fn resolve(self, result: WidgetResult) -> bool {
        self.0.send(result).is_ok()
    }
}

#[async_trait]
pub trait PaymentWidget: Send + Sync {
    /// Loads and arms the widget.
    async fn load(&self, config: &WidgetConfig) -> Result<(), CheckoutError>;

    /// Shows the widget for `attempt`. The result is delivered through `completion`; dropping it
    /// means the buyer closed the widget.
    async fn open(
        &self,
        attempt: &CheckoutAttempt,
        completion: WidgetCompletion,
    ) -> Result<(), CheckoutError>;
}

/// What a [`ChannelWidget`] forwards to whoever renders the hosted widget.
#[derive(Debug)]
pub enum WidgetRequest {
    Load(WidgetConfig),
    Open { attempt: CheckoutAttempt, completion: WidgetCompletion },
}

/// Bridges the orchestrator to a front end over a channel.
#[derive(Debug, Clone)]
pub struct ChannelWidget {
    requests: mpsc::Sender<WidgetRequest>,
}

impl ChannelWidget {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<WidgetRequest>) {
        let (requests, receiver) = mpsc::channel(buffer);
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl PaymentWidget for ChannelWidget {
    async fn load(&self, config: &WidgetConfig) -> Result<(), CheckoutError> {
        self.requests
            .send(WidgetRequest::Load(config.clone()))
            .await
            .map_err(|_| CheckoutError::Widget("front end is gone".to_owned()))
    }

    async fn open(
        &self,
        attempt: &CheckoutAttempt,
        completion: WidgetCompletion,
    ) -> Result<(), CheckoutError> {
        self.requests
            .send(WidgetRequest::Open { attempt: attempt.clone(), completion })
            .await
            .map_err(|_| CheckoutError::Widget("front end is gone".to_owned()))
    }
}
