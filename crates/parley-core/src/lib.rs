//! Domain layer for Parley.
//!
//! This crate holds the shared types, the error type, and the trait seams
//! (`ChatApi`, `SessionStore`) that the application layer is written against.
//! It knows nothing about HTTP or the filesystem.

pub mod api;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod store;

// Re-export common error type
pub use error::ParleyError;
pub use error::Result;
