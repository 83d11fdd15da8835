//! The chat backend as a capability seam.
//!
//! The application layer is written against this trait so the controllers
//! can be exercised with in-memory fakes; `parley-api` provides the reqwest
//! implementation. The token is passed explicitly on every authorized call,
//! keeping it read-only from the controllers' point of view.

use async_trait::async_trait;

use crate::auth::{LoginRequest, RegisterRequest, Session, User};
use crate::conversation::Conversation;
use crate::error::Result;
use crate::message::{Message, MessageExchange, OutboundMessage};

/// Client-side view of the chat service REST API.
///
/// Implementations map HTTP 401 on any token-bearing operation to
/// [`ParleyError::Unauthorized`](crate::ParleyError::Unauthorized). The
/// credential endpoints (`login`, `register`) are the exception: there 401
/// is the ordinary bad-credentials answer and stays an `Api` error carrying
/// the server's message. Every other failure becomes `Api` or `Network`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<Session>;

    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<Session>;

    /// `GET /auth/me`: identity check for a restored token.
    async fn me(&self, token: &str) -> Result<User>;

    /// `GET /chat/conversations`: newest-first, server ordering preserved.
    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>>;

    /// `POST /chat/conversation`: empty body when `title` is `None`.
    async fn create_conversation(&self, token: &str, title: Option<&str>) -> Result<Conversation>;

    /// `DELETE /chat/conversation/{id}`
    async fn delete_conversation(&self, token: &str, conversation_id: &str) -> Result<()>;

    /// `GET /chat/conversation/{id}/messages`: full history.
    async fn list_messages(&self, token: &str, conversation_id: &str) -> Result<Vec<Message>>;

    /// `POST /chat/message`: multipart with text and optional raw file
    /// bytes; returns the stored user message and the assistant reply.
    async fn send_message(&self, token: &str, outbound: OutboundMessage)
        -> Result<MessageExchange>;
}
