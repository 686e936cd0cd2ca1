use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::domain::{
    auth::AuthError,
    catalog::{CatalogError, StoreError},
    checkout::CheckoutError, media::MediaError,
};

#[derive(Debug)]
pub enum ClientError {
    Catalog(CatalogError),
    Auth(AuthError),
    Checkout(CheckoutError),
    Media(MediaError),
    Payload(String),
    NotFound(String),
    Internal(anyhow::Error),
}

const ASK_ADMINISTRATOR: &str = "Please ask your system administrator to check the logs.";

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        #[derive(serde::Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message) = match self {
            ClientError::Catalog(catalog_error) => match catalog_error {
                CatalogError::Validation(_) | CatalogError::ReadOnly(_) => {
                    (StatusCode::BAD_REQUEST, catalog_error.to_string())
                }
                CatalogError::ProductNotFound(_) => {
                    (StatusCode::NOT_FOUND, catalog_error.to_string())
                }
                CatalogError::Store(store_error) => {
                    error!("Catalog store failed with {store_error}");
                    (StatusCode::INTERNAL_SERVER_ERROR, ASK_ADMINISTRATOR.to_owned())
                }
            },
            ClientError::Auth(auth_error) => match auth_error {
                AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                    (StatusCode::UNAUTHORIZED, auth_error.to_string())
                }
                AuthError::Forbidden => (StatusCode::FORBIDDEN, auth_error.to_string()),
                AuthError::InvalidAccount(..) => (StatusCode::BAD_REQUEST, auth_error.to_string()),
                AuthError::Hashing(_) | AuthError::Decode(_) | AuthError::Database(_) => {
                    error!("Authentication failed with {auth_error}");
                    (StatusCode::INTERNAL_SERVER_ERROR, ASK_ADMINISTRATOR.to_owned())
                }
            },
            ClientError::Checkout(checkout_error) => match checkout_error {
                CheckoutError::Configuration(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, checkout_error.to_string())
                }
                CheckoutError::Transport(_) | CheckoutError::InvalidResponse(_) => {
                    error!("Checkout failed with {checkout_error}");
                    (StatusCode::INTERNAL_SERVER_ERROR, ASK_ADMINISTRATOR.to_owned())
                }
                _ => (StatusCode::BAD_REQUEST, checkout_error.to_string()),
            },
            ClientError::Media(media_error) => match media_error {
                MediaError::NotConfigured => {
                    (StatusCode::SERVICE_UNAVAILABLE, media_error.to_string())
                }
                MediaError::EmptyFile => (StatusCode::BAD_REQUEST, media_error.to_string()),
                MediaError::Rejected(_) | MediaError::Transport(_) => {
                    error!("Media upload failed with {media_error:?}");
                    (StatusCode::INTERNAL_SERVER_ERROR, media_error.to_string())
                }
            },
            ClientError::Payload(message) => (StatusCode::BAD_REQUEST, message),
            ClientError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ClientError::Internal(internal_error) => {
                error!("Request failed with {internal_error:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, ASK_ADMINISTRATOR.to_owned())
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<CatalogError> for ClientError {
    fn from(catalog_error: CatalogError) -> Self {
        ClientError::Catalog(catalog_error)
    }
}

impl From<StoreError> for ClientError {
    fn from(store_error: StoreError) -> Self {
        ClientError::Catalog(CatalogError::from(store_error))
    }
}

impl From<AuthError> for ClientError {
    fn from(auth_error: AuthError) -> Self {
        ClientError::Auth(auth_error)
    }
}

impl From<CheckoutError> for ClientError {
    fn from(checkout_error: CheckoutError) -> Self {
        ClientError::Checkout(checkout_error)
    }
}

impl From<MediaError> for ClientError {
    fn from(media_error: MediaError) -> Self {
        ClientError::Media(media_error)
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(value: anyhow::Error) -> Self {
        ClientError::Internal(value)
    }
}
