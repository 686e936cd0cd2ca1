#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid recipient {0}.")]
    InvalidRecipient(String),
    #[error("Error al enviar email: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
