//! Resolves who is calling. Sessions are issued elsewhere; this side only
//! reads them.
use crate::errors::PulseError;
use crate::session::SessionCookie;
use crate::storage;
use async_trait::async_trait;
use axum::http::HeaderMap;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The caller's identity, or `None` when the request is anonymous.
    async fn current_identity(&self, headers: &HeaderMap) -> Result<Option<Identity>, PulseError>;
}

/// Resolve an identity or fail with `Unauthorized`. An identity with an
/// empty id counts as absent.
pub async fn require_identity(
    resolver: &dyn IdentityResolver,
    headers: &HeaderMap,
) -> Result<Identity, PulseError> {
    match resolver.current_identity(headers).await? {
        Some(identity) if !identity.id.is_empty() => Ok(identity),
        _ => Err(PulseError::Unauthorized),
    }
}

/// Looks the session cookie up in the sessions table.
#[derive(Clone)]
pub struct SessionIdentityResolver {
    db: DatabaseConnection,
}

impl SessionIdentityResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentityResolver {
    async fn current_identity(&self, headers: &HeaderMap) -> Result<Option<Identity>, PulseError> {
        let Some(cookie) = SessionCookie::from_headers(headers) else {
            return Ok(None);
        };

        let session = storage::get_session(&self.db, &cookie.session_id).await?;
        Ok(session.map(|s| Identity { id: s.subject }))
    }
}
