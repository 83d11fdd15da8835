//! Session lifecycle: restore, login, register, logout.

use std::sync::Arc;

use parley_core::api::ChatApi;
use parley_core::auth::{LoginRequest, RegisterRequest, Session, SessionHandle};
use parley_core::error::{ParleyError, Result};
use parley_core::store::SessionStore;

/// Owns the authentication token and current user identity.
///
/// `SessionManager` is the only component that mutates the session; the
/// other controllers read it through the shared [`SessionHandle`]. Every
/// mutation writes through to the [`SessionStore`], so a restart restores
/// the session without re-login.
pub struct SessionManager {
    api: Arc<dyn ChatApi>,
    store: Arc<dyn SessionStore>,
    handle: SessionHandle,
}

impl SessionManager {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            handle: SessionHandle::new(),
        }
    }

    /// Returns a handle the other controllers read the token through.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub async fn current(&self) -> Option<Session> {
        self.handle.current().await
    }

    /// Attempts to restore a persisted session on startup.
    ///
    /// Reads the session file and validates the token against `/auth/me`.
    /// Any failure on that path (missing file, unreadable file, rejected
    /// token, network error) clears the persisted session and leaves the
    /// client anonymous. A failed check is terminal for this load; there is
    /// no retry.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let persisted = match self.store.load() {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::warn!(error = %err, "unreadable session file, starting anonymous");
                let _ = self.store.clear();
                return Ok(None);
            }
        };

        match self.api.me(&persisted.token).await {
            Ok(user) => {
                // The server's user object is authoritative over the
                // persisted copy.
                let session = Session {
                    token: persisted.token,
                    user,
                };
                self.handle.set(session.clone()).await;
                Ok(Some(session))
            }
            Err(err) => {
                tracing::info!(error = %err, "identity check failed, clearing stored session");
                let _ = self.store.clear();
                self.handle.clear().await;
                Ok(None)
            }
        }
    }

    /// Logs in with email/password credentials.
    ///
    /// On failure the existing session state (in memory and on disk) is left
    /// untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ParleyError::validation("Email and password are required"));
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let session = self.api.login(&request).await?;
        self.activate(session).await
    }

    /// Creates an account and logs in with it.
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() || full_name.trim().is_empty() {
            return Err(ParleyError::validation(
                "Email, password and full name are required",
            ));
        }

        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            full_name: full_name.trim().to_string(),
        };
        let session = self.api.register(&request).await?;
        self.activate(session).await
    }

    /// Clears the session in memory and on disk. No server call is made;
    /// the token model is stateless.
    pub async fn logout(&self) -> Result<()> {
        self.handle.clear().await;
        self.store.clear()
    }

    async fn activate(&self, session: Session) -> Result<Session> {
        self.store.save(&session)?;
        self.handle.set(session.clone()).await;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChatApi, MemorySessionStore, VALID_TOKEN, test_user};

    fn manager(api: Arc<FakeChatApi>, store: Arc<MemorySessionStore>) -> SessionManager {
        SessionManager::new(api, store)
    }

    #[tokio::test]
    async fn login_persists_token_and_authenticates() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(api, store.clone());

        let session = manager.login("a@b.com", "x").await.unwrap();
        assert_eq!(session.token, VALID_TOKEN);
        assert_eq!(session.user, test_user());

        // Written through to durable storage.
        let persisted = store.load().unwrap().unwrap();
        assert_eq!(persisted.token, VALID_TOKEN);
        assert!(manager.handle().is_authenticated().await);
    }

    #[tokio::test]
    async fn failed_login_leaves_state_untouched() {
        let api = FakeChatApi::new();
        api.fail_next("login");
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(api, store.clone());

        let result = manager.login("a@b.com", "wrong").await;
        assert!(result.is_err());
        assert!(store.load().unwrap().is_none());
        assert!(!manager.handle().is_authenticated().await);
    }

    #[tokio::test]
    async fn failed_relogin_keeps_the_existing_session() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(api.clone(), store.clone());

        manager.login("a@b.com", "x").await.unwrap();

        // A mistyped password on a re-login must not drop the live session.
        api.fail_next("login");
        assert!(manager.login("a@b.com", "typo").await.is_err());

        assert!(manager.handle().is_authenticated().await);
        assert_eq!(store.load().unwrap().unwrap().token, VALID_TOKEN);
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_before_any_call() {
        let api = FakeChatApi::new();
        let manager = manager(api.clone(), Arc::new(MemorySessionStore::default()));

        let result = manager.login("  ", "").await;
        assert!(matches!(result, Err(ParleyError::Validation(_))));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn restore_validates_the_stored_token() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        store.seed(VALID_TOKEN);
        let manager = manager(api, store);

        let restored = manager.restore().await.unwrap().unwrap();
        assert_eq!(restored.user, test_user());
        assert!(manager.handle().is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_clears_a_rejected_token() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        store.seed("expired-token");
        let manager = manager(api, store.clone());

        let restored = manager.restore().await.unwrap();
        assert!(restored.is_none());
        assert!(store.load().unwrap().is_none());
        assert!(!manager.handle().is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_without_a_file_stays_anonymous() {
        let api = FakeChatApi::new();
        let manager = manager(api.clone(), Arc::new(MemorySessionStore::default()));

        assert!(manager.restore().await.unwrap().is_none());
        // No identity check without a token.
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_memory_and_disk() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(api, store.clone());

        manager.login("a@b.com", "x").await.unwrap();
        manager.logout().await.unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(!manager.handle().is_authenticated().await);
    }

    #[tokio::test]
    async fn register_activates_the_new_account() {
        let api = FakeChatApi::new();
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(api, store.clone());

        let session = manager.register("a@b.com", "x", "A").await.unwrap();
        assert_eq!(session.token, VALID_TOKEN);
        assert!(store.load().unwrap().is_some());
    }
}
