use validator::ValidationErrors;

use crate::domain::validation::first_message;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Row {0} does not exist.")]
    NotFound(String),
    #[error("The store rejected the write: {0}")]
    Rejected(String),
    #[error("Stored row could not be read: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    /// Constraint and type errors raised by Postgres are the store refusing the row,
    /// everything else is an infrastructure problem.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::Rejected(db_err.message().to_owned()),
            other => StoreError::Database(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("Product {0} does not exist.")]
    ProductNotFound(String),
    #[error("Product {0} belongs to the demo catalog and cannot be modified.")]
    ReadOnly(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::Validation(first_message(&errors))
    }
}
