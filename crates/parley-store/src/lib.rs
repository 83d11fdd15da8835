//! On-disk persistence for Parley.
//!
//! Holds the platform path layout and the file-backed implementation of the
//! [`parley_core::store::SessionStore`] seam.

pub mod paths;
pub mod session_file;

pub use paths::ParleyPaths;
pub use session_file::FileSessionStore;
