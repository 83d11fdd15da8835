//! Persisted-session seam.

use crate::auth::Session;
use crate::error::Result;

/// Durable storage for the session token and user identity.
///
/// The session manager writes through on login/register and clears on logout
/// or a failed identity check, so a restart restores the session without
/// re-login (provided the token is still valid server-side).
pub trait SessionStore: Send + Sync {
    /// Returns the persisted session, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<Session>>;

    /// Persists the session, replacing any previous one.
    fn save(&self, session: &Session) -> Result<()>;

    /// Removes the persisted session. Clearing an empty store is not an
    /// error.
    fn clear(&self) -> Result<()>;
}
