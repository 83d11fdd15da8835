//! Session and identity domain model.
//!
//! A `Session` is the pair of an opaque bearer token and the user it
//! identifies. It is created by login/register, restored from disk on
//! startup, and destroyed on logout or a failed identity check.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ParleyError, Result};

/// The authenticated user as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

/// An authenticated session: opaque bearer token plus user identity.
///
/// This is the exact shape persisted to disk, so a reload restores the
/// session verbatim (the token may still be rejected server-side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Credentials for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Shared, read-mostly view of the current session.
///
/// The session manager is the only writer; the conversation and message
/// controllers only read the token through [`SessionHandle::token`]. Cloning
/// the handle shares the same underlying slot.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new session (login, register, restore).
    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Drops the session (logout, failed identity check).
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    /// Returns the current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Returns the bearer token, or `Unauthorized` when anonymous.
    pub async fn token(&self) -> Result<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|session| session.token.clone())
            .ok_or(ParleyError::Unauthorized)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
