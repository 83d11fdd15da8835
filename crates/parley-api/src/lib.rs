//! HTTP implementation of the chat service API.
//!
//! This crate turns the [`parley_core::api::ChatApi`] seam into real
//! requests against the backend's JSON/multipart endpoints.

pub mod client;
mod dto;

pub use client::HttpChatApi;
