//! Message exchange: history loading and the optimistic send protocol.
//!
//! A send walks a fixed state machine:
//!
//! ```text
//! Idle -> Optimistic(pending) -> {Reconciled | RolledBack} -> Idle
//! ```
//!
//! [`begin_send`] performs the synchronous entry into `Optimistic` (guards,
//! staging the pending entry) and [`finish_send`] performs the synchronous
//! exit (reconcile or rollback), so both transitions are testable without a
//! network. [`send`] wires the two around the actual round trip.
//!
//! [`begin_send`]: MessageExchangeController::begin_send
//! [`finish_send`]: MessageExchangeController::finish_send
//! [`send`]: MessageExchangeController::send

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use parley_core::api::ChatApi;
use parley_core::auth::SessionHandle;
use parley_core::conversation::title_from_message;
use parley_core::error::Result;
use parley_core::message::{
    MessageEntry, MessageExchange, OutboundMessage, PendingAttachment, PendingMessage,
};

use crate::conversations::ConversationListController;

/// Result of a [`send`](MessageExchangeController::send) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The round trip completed and the list was reconciled.
    Sent,
    /// Guarded no-op: blank input with no attachment, or a send already in
    /// flight.
    Ignored,
}

/// Owns the rendered message list for the selected conversation and at most
/// one staged attachment.
pub struct MessageExchangeController {
    api: Arc<dyn ChatApi>,
    session: SessionHandle,
    messages: Vec<MessageEntry>,
    staged_attachment: Option<PendingAttachment>,
    in_flight: bool,
}

impl MessageExchangeController {
    pub fn new(api: Arc<dyn ChatApi>, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            messages: Vec::new(),
            staged_attachment: None,
            in_flight: false,
        }
    }

    pub fn messages(&self) -> &[MessageEntry] {
        &self.messages
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn staged_attachment(&self) -> Option<&PendingAttachment> {
        self.staged_attachment.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight
    }

    /// Stages a file for the next send, replacing any previous one.
    ///
    /// An oversized file is rejected here, before any network call, and the
    /// previous selection is cleared as well (matching the behavior of a
    /// cleared file input).
    pub fn stage_attachment(
        &mut self,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<()> {
        match PendingAttachment::new(file_name, mime_type, bytes) {
            Ok(attachment) => {
                self.staged_attachment = Some(attachment);
                Ok(())
            }
            Err(err) => {
                self.staged_attachment = None;
                Err(err)
            }
        }
    }

    pub fn clear_attachment(&mut self) {
        self.staged_attachment = None;
    }

    /// Replaces the message list with the full server history.
    ///
    /// On any error the list is cleared rather than left stale.
    pub async fn load_history(&mut self, conversation_id: &str) -> Result<()> {
        let result = async {
            let token = self.session.token().await?;
            self.api.list_messages(&token, conversation_id).await
        }
        .await;

        match result {
            Ok(history) => {
                self.messages = history.into_iter().map(MessageEntry::Confirmed).collect();
                Ok(())
            }
            Err(err) => {
                self.messages.clear();
                Err(err)
            }
        }
    }

    /// Synchronous entry into the optimistic state.
    ///
    /// Returns `None` for the guarded no-ops (blank text with no attachment,
    /// or a send already in flight). Otherwise appends a pending entry to
    /// the visible list, consumes the staged attachment, marks the
    /// controller in flight, and hands back the outbound request tagged with
    /// the provisional id. The pending entry is visible before any network
    /// activity starts.
    pub fn begin_send(
        &mut self,
        conversation_id: &str,
        text: &str,
    ) -> Option<(Uuid, OutboundMessage)> {
        if self.in_flight {
            return None;
        }
        if text.trim().is_empty() && self.staged_attachment.is_none() {
            return None;
        }

        let attachment = self.staged_attachment.take();
        let provisional_id = Uuid::new_v4();

        // Non-image files have no preview; annotate the optimistic content
        // so the staged file is visible in the list.
        let content = match &attachment {
            Some(file) if !file.is_image() => format!(
                "{} [attached: {} ({})]",
                text,
                file.file_name(),
                file.mime_type()
            ),
            _ => text.to_string(),
        };
        let image_preview = attachment.as_ref().and_then(|a| a.preview_data_uri());

        self.messages.push(MessageEntry::Pending(PendingMessage {
            provisional_id,
            conversation_id: conversation_id.to_string(),
            content,
            created_at: Utc::now(),
            image_preview,
        }));
        self.in_flight = true;

        Some((
            provisional_id,
            OutboundMessage {
                conversation_id: conversation_id.to_string(),
                text: text.to_string(),
                attachment,
            },
        ))
    }

    /// Synchronous exit from the optimistic state.
    ///
    /// Always removes exactly the pending entry with this provisional id and
    /// returns the controller to idle. On success the server-confirmed user
    /// message and the assistant reply are appended, in that order; on
    /// failure nothing else changes (the typed text and attachment are not
    /// restored).
    pub fn finish_send(
        &mut self,
        provisional_id: Uuid,
        outcome: Result<MessageExchange>,
    ) -> Result<()> {
        self.in_flight = false;
        self.messages.retain(|entry| {
            !matches!(entry, MessageEntry::Pending(pending) if pending.provisional_id == provisional_id)
        });

        let exchange = outcome?;
        self.messages
            .push(MessageEntry::Confirmed(exchange.user_message));
        self.messages
            .push(MessageEntry::Confirmed(exchange.assistant_message));
        Ok(())
    }

    /// Sends a message to the selected conversation, creating one first when
    /// none exists (titled with a prefix of the text).
    ///
    /// After a successful exchange the conversation list is refreshed, since
    /// the server may have retitled the thread or bumped its timestamp; a
    /// failure of that refresh is logged, not surfaced.
    pub async fn send(
        &mut self,
        conversations: &mut ConversationListController,
        text: &str,
    ) -> Result<SendOutcome> {
        // Guard before resolving a conversation so a no-op never creates
        // one implicitly.
        if self.in_flight || (text.trim().is_empty() && self.staged_attachment.is_none()) {
            return Ok(SendOutcome::Ignored);
        }

        let conversation_id = match conversations.selected_id() {
            Some(id) => id.to_string(),
            None => {
                let title = title_from_message(text);
                conversations.create(Some(&title)).await?.id
            }
        };

        let Some((provisional_id, outbound)) = self.begin_send(&conversation_id, text) else {
            return Ok(SendOutcome::Ignored);
        };

        let result = match self.session.token().await {
            Ok(token) => self.api.send_message(&token, outbound).await,
            Err(err) => Err(err),
        };
        self.finish_send(provisional_id, result)?;

        if let Err(err) = conversations.refresh().await {
            tracing::warn!(error = %err, "conversation list refresh after send failed");
        }

        Ok(SendOutcome::Sent)
    }
}
