mod charge_client;
mod errors;
mod orchestrator;
mod widget;

pub use charge_client::{ChargeClient, HttpChargeClient, SharedChargeClient};
pub use errors::CheckoutError;
pub use orchestrator::{CheckoutOptions, CheckoutOrchestrator, CheckoutOutcome, CheckoutState};
pub use widget::{
    ChannelWidget, CheckoutAttempt, PaymentMethods, PaymentWidget, WidgetCompletion, WidgetConfig,
    WidgetOptions, WidgetRequest, WidgetResult, WidgetSettings, widget_config_endpoint,
};
