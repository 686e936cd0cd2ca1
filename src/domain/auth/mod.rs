mod errors;
mod identity;
mod session;

pub use errors::AuthError;
pub use identity::{
    IdentityProvider, MemoryIdentityProvider, NewAccount, PgIdentityProvider, Role,
    SharedIdentityProvider, User, UserId, hash_password, verify_password,
};
pub use session::{
    AdminSession, AuthState, LoginPayload, SESSION_COOKIE, SESSION_HEADER, Session, SessionId,
    SessionResponse, login_endpoint, logout_endpoint, session_endpoint,
};
