//! Session file storage.
//!
//! Persists the session (token + user) as JSON so a restart restores it
//! without re-login. The file is stored verbatim and cleared on logout or a
//! failed identity check.

use std::fs;
use std::path::PathBuf;

use parley_core::ParleyError;
use parley_core::auth::Session;
use parley_core::store::SessionStore;

use crate::paths::ParleyPaths;

/// Errors that can occur during session file operations.
#[derive(Debug)]
pub enum SessionFileError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for SessionFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionFileError::IoError(e) => write!(f, "I/O error: {}", e),
            SessionFileError::ParseError(e) => write!(f, "JSON parse error: {}", e),
            SessionFileError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for SessionFileError {}

impl From<std::io::Error> for SessionFileError {
    fn from(e: std::io::Error) -> Self {
        SessionFileError::IoError(e)
    }
}

impl From<serde_json::Error> for SessionFileError {
    fn from(e: serde_json::Error) -> Self {
        SessionFileError::ParseError(e)
    }
}

impl From<SessionFileError> for ParleyError {
    fn from(e: SessionFileError) -> Self {
        ParleyError::storage(e.to_string())
    }
}

/// File-backed [`SessionStore`] writing `session.json` in the Parley config
/// directory.
///
/// # Security Note
///
/// The file contains a live bearer token in plaintext JSON; it is created
/// with permissions 600 on unix systems.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store at the default path (`~/.config/parley/session.json`).
    pub fn new() -> Result<Self, SessionFileError> {
        let path = ParleyPaths::session_file().map_err(|_| SessionFileError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path to the session file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Result<Option<Session>, SessionFileError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    fn write(&self, session: &Session) -> Result<(), SessionFileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn remove(&self) -> Result<(), SessionFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> parley_core::Result<Option<Session>> {
        Ok(self.read()?)
    }

    fn save(&self, session: &Session) -> parley_core::Result<()> {
        tracing::debug!(path = %self.path.display(), "persisting session");
        Ok(self.write(session)?)
    }

    fn clear(&self) -> parley_core::Result<()> {
        tracing::debug!(path = %self.path.display(), "clearing persisted session");
        Ok(self.remove()?)
    }
}
