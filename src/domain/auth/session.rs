//! Auth slice: the single signed-in session of this storefront and the admin gate on HTTP routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, header, request::Parts},
    response::IntoResponse,
};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::{
    domain::{
        notifier::SharedNotifier,
        preferences::{AUTH_USER_KEY, SharedLocalStore, forget, persist, restore},
    },
    infra::ClientError,
    uuid_id,
};

use super::{AuthError, Role, SharedIdentityProvider, User};

uuid_id!(SessionId);

pub const SESSION_HEADER: &str = "x-session-id";
pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user: User,
}

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    pub is_admin: bool,
    /// Only issued by login, to the client that signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub user: Option<User>,
}

impl From<Option<Session>> for SessionResponse {
    fn from(session: Option<Session>) -> Self {
        Self {
            authenticated: session.is_some(),
            is_admin: session.as_ref().is_some_and(|s| s.user.role == Role::Admin),
            session_id: None,
            user: session.map(|s| s.user),
        }
    }
}

pub async fn login_endpoint(
    State(auth): State<AuthState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ClientError> {
    let session = auth
        .sign_in(&payload.email, &payload.password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", session.id);
    let session_id = Some(session.id);
    let response = SessionResponse { session_id, ..SessionResponse::from(Some(session)) };
    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

/// Ends the session the caller presents. Anyone else's session is left alone.
pub async fn logout_endpoint(
    State(auth): State<AuthState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ClientError> {
    let session_id = session_id_from(&headers).ok_or(AuthError::Unauthenticated)?;
    auth.logout_session(session_id).await?;
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionResponse::from(None))))
}

/// Reports the caller's own session. Callers without the current session id see a signed-out state.
pub async fn session_endpoint(
    State(auth): State<AuthState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let session = match session_id_from(&headers) {
        Some(session_id) => auth.session_for(session_id).await,
        None => None,
    };
    Json(SessionResponse::from(session))
}

/// Extractor for admin-only handlers. Reads the session id from the `x-session-id` header or the
/// `session_id` cookie.
#[derive(Debug, Clone)]
pub struct AdminSession(pub User);

impl<S> FromRequestParts<S> for AdminSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ClientError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let session_id = session_id_from(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let user = auth.authorize(session_id).await?;
        Ok(AdminSession(user))
    }
}

fn session_id_from(headers: &HeaderMap) -> Option<SessionId> {
    if let Some(value) = headers.get(SESSION_HEADER) {
        return value.to_str().ok()?.trim().parse().ok();
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

//------------------------ Auth State ---------------------------

#[derive(Clone)]
pub struct AuthState {
    identity: SharedIdentityProvider,
    storage: SharedLocalStore,
    notifier: SharedNotifier,
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthState {
    /// Restores a persisted session, if there is one.
    pub async fn load(
        identity: SharedIdentityProvider,
        storage: SharedLocalStore,
        notifier: SharedNotifier,
    ) -> Self {
        let session: Option<Session> = restore(storage.as_ref(), AUTH_USER_KEY).await;
        Self { identity, storage, notifier, session: Arc::new(RwLock::new(session)) }
    }

    /// True iff the identity provider accepts the pair. A rejected pair leaves no session behind.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        Ok(self.sign_in(email, password).await?.is_some())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let user = match self.identity.verify(email, password).await {
            Ok(user) => user,
            Err(e) => {
                error!("Error signing in: {e}");
                self.notifier.error("Error al iniciar sesión");
                return Err(e);
            }
        };
        let Some(user) = user else {
            self.notifier.error("Credenciales incorrectas");
            return Ok(None);
        };

        let session = Session { id: SessionId::new(), user };
        persist(self.storage.as_ref(), AUTH_USER_KEY, &session).await;
        *self.session.write().await = Some(session.clone());
        info!("{} signed in.", session.user.email);
        self.notifier.success("¡Bienvenido al panel de administración!");
        Ok(Some(session))
    }

    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        forget(self.storage.as_ref(), AUTH_USER_KEY).await;
        if let Some(session) = previous {
            info!("{} signed out.", session.user.email);
        }
    }

    /// Signs out only when `session_id` is the current session.
    pub async fn logout_session(&self, session_id: SessionId) -> Result<(), AuthError> {
        if self.session_for(session_id).await.is_none() {
            return Err(AuthError::Unauthenticated);
        }
        self.logout().await;
        Ok(())
    }

    pub async fn session_for(&self, session_id: SessionId) -> Option<Session> {
        self.session.read().await.as_ref().filter(|s| s.id == session_id).cloned()
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.session.read().await.as_ref().is_some_and(|s| s.user.role == Role::Admin)
    }

    /// The admin user behind `session_id`, when it is the current session.
    pub async fn authorize(&self, session_id: SessionId) -> Result<User, AuthError> {
        match self.session.read().await.as_ref() {
            Some(session) if session.id == session_id => {
                if session.user.role == Role::Admin {
                    Ok(session.user.clone())
                } else {
                    Err(AuthError::Forbidden)
                }
            }
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

//-------------------------- Tests -------------------------------
