//! Credential verification. Accounts live in the `admin_users` table as argon2 PHC hashes; nothing
//! is compiled in.

use std::sync::{Arc, Mutex};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use async_trait::async_trait;
use rand_core::OsRng;
use sqlx::PgPool;
use strum_macros::{Display, EnumString};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::validation::{email_address, first_message},
    uuid_id,
};

use super::AuthError;

uuid_id!(UserId);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// An account to create or replace, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewAccount {
    #[validate(custom(function = "email_address", message = "invalid email"))]
    pub email: String,
    pub name: String,
    #[validate(length(min = 1, message = "empty password"))]
    pub password: String,
    pub role: Role,
}

impl NewAccount {
    fn checked(&self) -> Result<(), AuthError> {
        self.validate()
            .map_err(|e| AuthError::InvalidAccount(self.email.clone(), first_message(&e)))
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The account matching both email and password, if any.
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AuthError>;

    async fn upsert_account(&self, account: &NewAccount) -> Result<User, AuthError>;
}

pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;

pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

//-------------------------- Postgres ----------------------------

#[derive(Debug, Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    password_hash: String,
}

impl AccountRow {
    fn user(&self) -> Result<User, AuthError> {
        let role = self
            .role
            .parse()
            .map_err(|_| AuthError::Decode(format!("unknown role {}", self.role)))?;
        Ok(User { id: self.id.into(), email: self.email.clone(), name: self.name.clone(), role })
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, name, role, password_hash FROM admin_users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) if verify_password(password, &row.password_hash).await? => row.user().map(Some),
            _ => Ok(None),
        }
    }

    async fn upsert_account(&self, account: &NewAccount) -> Result<User, AuthError> {
        account.checked()?;
        let password_hash = hash_password(&account.password).await?;
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO admin_users (email, name, role, password_hash)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
                SET name = EXCLUDED.name, role = EXCLUDED.role, password_hash = EXCLUDED.password_hash
             RETURNING id, email, name, role, password_hash",
        )
        .bind(&account.email)
        .bind(&account.name)
        .bind(account.role.to_string())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        info!("Account {} saved.", row.email);
        row.user()
    }
}

//--------------------------- Memory -----------------------------

#[derive(Clone, Default)]
pub struct MemoryIdentityProvider {
    accounts: Arc<Mutex<Vec<(User, String)>>>,
}

impl MemoryIdentityProvider {
    fn find(&self, email: &str) -> Option<(User, String)> {
        let accounts = self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.iter().find(|(user, _)| user.email == email).cloned()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        match self.find(email) {
            Some((user, hash)) if verify_password(password, &hash).await? => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    async fn upsert_account(&self, account: &NewAccount) -> Result<User, AuthError> {
        account.checked()?;
        let password_hash = hash_password(&account.password).await?;

        let mut accounts = self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = accounts
            .iter()
            .find(|(user, _)| user.email == account.email)
            .map(|(user, _)| user.id)
            .unwrap_or_default();
        accounts.retain(|(user, _)| user.email != account.email);

        let user = User {
            id,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role,
        };
        accounts.push((user.clone(), password_hash));
        info!("Account {} saved.", user.email);
        Ok(user)
    }
}

//-------------------------- Tests -------------------------------
