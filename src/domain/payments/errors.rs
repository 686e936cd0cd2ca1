use crate::domain::catalog::StoreError;

/// Failures of the payment capture flow. The messages are what the buyer sees.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Faltan parámetros requeridos")]
    MissingParameters,
    #[error("Email inválido")]
    InvalidEmail,
    #[error("El monto debe ser mayor a cero")]
    InvalidAmount,
    #[error("Llave secreta de la pasarela de pagos no configurada")]
    NotConfigured,
    #[error("Producto no encontrado")]
    ProductNotFound,
    #[error("{0}")]
    Declined(String),
    #[error("El pago no pudo ser procesado")]
    NotSuccessful,
    #[error("Error al registrar la venta")]
    SaleNotRecorded(#[source] StoreError),
    #[error("Error al procesar el pago")]
    Store(#[source] StoreError),
    #[error("Error al procesar el pago")]
    Gateway(#[from] reqwest::Error),
}
