#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Error de configuración: {0}")]
    Configuration(String),
    #[error("The payment widget could not be used: {0}")]
    Widget(String),
    #[error("A checkout attempt is already waiting on the payment widget.")]
    AttemptInProgress,
    #[error("Checkout cannot {0} while {1}.")]
    InvalidTransition(&'static str, String),
    #[error("Unexpected charge response: {0}")]
    InvalidResponse(String),
    #[error("Charge request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
