//! Message domain model.
//!
//! The message list rendered for a conversation is a prefix-consistent view
//! of server state plus at most one outstanding optimistic entry. That
//! distinction is encoded in the type: [`MessageEntry::Confirmed`] wraps a
//! server message, [`MessageEntry::Pending`] wraps a locally synthesized one
//! awaiting its round trip, so reconciliation is a typed match rather than an
//! id-string convention.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParleyError, Result};

/// Attachments above this size are rejected before any network call.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A server-confirmed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub image_data: Option<String>,
}

/// The pair of messages the server returns for one send: the stored user
/// message and the assistant's reply, appended in that order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageExchange {
    pub user_message: Message,
    pub assistant_message: Message,
}

/// A user message staged locally while its round trip is outstanding.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    /// Locally unique id used to remove exactly this entry on reconcile.
    pub provisional_id: Uuid,
    pub conversation_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Data-URI preview when an image attachment was staged with the send.
    pub image_preview: Option<String>,
}

/// One entry of the rendered message list.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEntry {
    Confirmed(Message),
    Pending(PendingMessage),
}

impl MessageEntry {
    pub fn role(&self) -> Role {
        match self {
            Self::Confirmed(message) => message.role,
            // Only user messages are ever optimistic.
            Self::Pending(_) => Role::User,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Confirmed(message) => &message.content,
            Self::Pending(pending) => &pending.content,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// A file staged for the next send.
///
/// Transient: exists only between selection and send/cancel, and is never
/// persisted. The raw bytes travel in the multipart request; the preview is
/// a purely local rendering aid.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttachment {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl PendingAttachment {
    /// Stages a file, enforcing the size limit up front.
    ///
    /// How the bytes were obtained (filesystem, clipboard, test fixture) is
    /// the caller's concern; this type only sees the result.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let file_name = file_name.into();
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(ParleyError::validation(format!(
                "File '{}' is {} bytes; the limit is {} (10 MB)",
                file_name,
                bytes.len(),
                MAX_ATTACHMENT_BYTES
            )));
        }
        Ok(Self {
            file_name,
            mime_type: mime_type.into(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Base64 data URI for image attachments, shown locally before the
    /// server echoes its own copy back. `None` for non-image files.
    pub fn preview_data_uri(&self) -> Option<String> {
        if !self.is_image() {
            return None;
        }
        let data = BASE64_STANDARD.encode(&self.bytes);
        Some(format!("data:{};base64,{}", self.mime_type, data))
    }
}

/// Everything needed for one `POST /chat/message` round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub conversation_id: String,
    pub text: String,
    pub attachment: Option<PendingAttachment>,
}
