//! Conversation list state: fetch, create, select, delete.

use std::sync::Arc;

use parley_core::api::ChatApi;
use parley_core::auth::SessionHandle;
use parley_core::conversation::Conversation;
use parley_core::error::{ParleyError, Result};

/// What happened to the selection after a successful [`remove`].
///
/// [`remove`]: ConversationListController::remove
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    /// A non-selected conversation was removed; the active conversation and
    /// its loaded messages are untouched.
    SelectionKept,
    /// The selected conversation was removed. The new selection is the head
    /// of the remaining list, or `None` when the list became empty; either
    /// way the caller must reset the message view.
    Reselected(Option<String>),
}

/// Owns the conversation list and the "currently selected" pointer.
///
/// Ordering is the server's (newest-first); the client never re-sorts. On
/// any API failure local state is left in its last-known-good form.
pub struct ConversationListController {
    api: Arc<dyn ChatApi>,
    session: SessionHandle,
    conversations: Vec<Conversation>,
    selected: Option<String>,
}

impl ConversationListController {
    pub fn new(api: Arc<dyn ChatApi>, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            conversations: Vec::new(),
            selected: None,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Conversation> {
        let id = self.selected.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Replaces the local list with the server's.
    ///
    /// If the selected conversation is no longer present (deleted elsewhere)
    /// the head of the new list is selected instead, or nothing when the
    /// list is empty. Returns whether the selection changed, so the caller
    /// knows to reload the message view.
    pub async fn refresh(&mut self) -> Result<bool> {
        let token = self.session.token().await?;
        self.conversations = self.api.list_conversations(&token).await?;

        let still_present = self
            .selected
            .as_deref()
            .is_some_and(|id| self.conversations.iter().any(|c| c.id == id));

        if still_present {
            return Ok(false);
        }

        let head = self.conversations.first().map(|c| c.id.clone());
        let changed = head != self.selected;
        self.selected = head;
        Ok(changed)
    }

    /// Creates a conversation, inserts it at the head and selects it.
    ///
    /// The caller clears the message view for the fresh thread. On failure
    /// nothing changes locally.
    pub async fn create(&mut self, title: Option<&str>) -> Result<Conversation> {
        let token = self.session.token().await?;
        let conversation = self.api.create_conversation(&token, title).await?;
        tracing::debug!(id = %conversation.id, "created conversation");
        self.conversations.insert(0, conversation.clone());
        self.selected = Some(conversation.id.clone());
        Ok(conversation)
    }

    /// Sets the active conversation. Selecting the already-active id is
    /// idempotent.
    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.conversations.iter().any(|c| c.id == id) {
            return Err(ParleyError::validation(format!(
                "No conversation with id '{id}'"
            )));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Deletes a conversation.
    ///
    /// On success the entry is dropped locally; if it was the active one,
    /// the head of the remaining list (or nothing) becomes active and the
    /// outcome tells the caller to reset the message view. On failure local
    /// state is untouched.
    pub async fn remove(&mut self, id: &str) -> Result<RemovalOutcome> {
        let token = self.session.token().await?;
        self.api.delete_conversation(&token, id).await?;

        self.conversations.retain(|c| c.id != id);

        if self.selected.as_deref() == Some(id) {
            self.selected = self.conversations.first().map(|c| c.id.clone());
            Ok(RemovalOutcome::Reselected(self.selected.clone()))
        } else {
            Ok(RemovalOutcome::SelectionKept)
        }
    }
}
