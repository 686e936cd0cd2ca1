#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect email or password.")]
    InvalidCredentials,
    #[error("Sign in to continue.")]
    Unauthenticated,
    #[error("Administrator access is required.")]
    Forbidden,
    #[error("Account {0} could not be saved: {1}")]
    InvalidAccount(String, String),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Stored account could not be read: {0}")]
    Decode(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::Hashing(err.to_string())
    }
}
