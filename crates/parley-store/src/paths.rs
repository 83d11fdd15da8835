//! Unified path management for Parley client files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/parley/            # Config directory
//! ├── config.toml              # Backend base URL, request timeout
//! ├── session.json             # Persisted session (token + user)
//! └── logs/
//!     └── parley.log           # Tracing output (REPL keeps stdout clean)
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Parley.
pub struct ParleyPaths;

impl ParleyPaths {
    /// Returns the Parley configuration directory
    /// (e.g. `~/.config/parley/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("parley"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the persisted session file.
    ///
    /// # Security Note
    ///
    /// The session file holds a live bearer token; it is written with mode
    /// 600 on unix systems.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    /// Returns the log directory, e.g. `~/.config/parley/logs/`.
    pub fn log_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_the_config_dir() {
        // dirs resolves a home in test environments too.
        let config_dir = ParleyPaths::config_dir().unwrap();
        assert!(ParleyPaths::session_file().unwrap().starts_with(&config_dir));
        assert!(ParleyPaths::config_file().unwrap().starts_with(&config_dir));
        assert!(ParleyPaths::log_dir().unwrap().starts_with(&config_dir));
    }
}
