//! In-memory test doubles for the `ChatApi` and `SessionStore` seams.
//!
//! `FakeChatApi` behaves like a tiny backend: it accepts one valid token,
//! keeps conversations newest-first, echoes sent messages back as the
//! assistant, and can be told to fail the next call of a given operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use parley_core::api::ChatApi;
use parley_core::auth::{LoginRequest, RegisterRequest, Session, SessionHandle, User};
use parley_core::conversation::Conversation;
use parley_core::error::{ParleyError, Result};
use parley_core::message::{Message, MessageExchange, OutboundMessage, Role};
use parley_core::store::SessionStore;

pub const VALID_TOKEN: &str = "t1";

pub fn test_user() -> User {
    User {
        id: "u1".to_string(),
        full_name: "A".to_string(),
        email: "a@b.com".to_string(),
    }
}

pub fn test_session() -> Session {
    Session {
        token: VALID_TOKEN.to_string(),
        user: test_user(),
    }
}

/// A session handle already carrying the valid token.
pub async fn authed_session() -> SessionHandle {
    let handle = SessionHandle::new();
    handle.set(test_session()).await;
    handle
}

#[derive(Default)]
struct FakeState {
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    fail_next: HashSet<&'static str>,
    calls: Vec<&'static str>,
    last_send_conversation_id: Option<String>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn record(&mut self, op: &'static str) -> Result<()> {
        self.calls.push(op);
        if self.fail_next.remove(op) {
            return Err(ParleyError::api(500, format!("{op} failed")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeChatApi {
    state: Mutex<FakeState>,
}

impl FakeChatApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next call of `op` fail with a server error.
    pub fn fail_next(&self, op: &'static str) {
        self.state.lock().unwrap().fail_next.insert(op);
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_send_conversation_id(&self) -> Option<String> {
        self.state.lock().unwrap().last_send_conversation_id.clone()
    }

    /// Inserts a conversation at the head, as the server would for the
    /// newest thread.
    pub fn seed_conversation(&self, title: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("c");
        state.conversations.insert(
            0,
            Conversation {
                id: id.clone(),
                title: title.to_string(),
                updated_at: Utc::now(),
            },
        );
        id
    }

    /// Removes a conversation server-side only ("deleted elsewhere").
    pub fn drop_conversation(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.conversations.retain(|c| c.id != id);
        state.messages.remove(id);
    }

    fn check_token(token: &str) -> Result<()> {
        if token == VALID_TOKEN {
            Ok(())
        } else {
            Err(ParleyError::Unauthorized)
        }
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn register(&self, _request: &RegisterRequest) -> Result<Session> {
        self.state.lock().unwrap().record("register")?;
        Ok(test_session())
    }

    async fn login(&self, _request: &LoginRequest) -> Result<Session> {
        self.state.lock().unwrap().record("login")?;
        Ok(test_session())
    }

    async fn me(&self, token: &str) -> Result<User> {
        self.state.lock().unwrap().record("me")?;
        Self::check_token(token)?;
        Ok(test_user())
    }

    async fn list_conversations(&self, token: &str) -> Result<Vec<Conversation>> {
        let mut state = self.state.lock().unwrap();
        state.record("list_conversations")?;
        Self::check_token(token)?;
        Ok(state.conversations.clone())
    }

    async fn create_conversation(&self, token: &str, title: Option<&str>) -> Result<Conversation> {
        let mut state = self.state.lock().unwrap();
        state.record("create_conversation")?;
        Self::check_token(token)?;

        let id = state.next_id("c");
        let conversation = Conversation {
            id,
            title: title.unwrap_or("New Chat").to_string(),
            updated_at: Utc::now(),
        };
        state.conversations.insert(0, conversation.clone());
        Ok(conversation)
    }

    async fn delete_conversation(&self, token: &str, conversation_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record("delete_conversation")?;
        Self::check_token(token)?;

        let before = state.conversations.len();
        state.conversations.retain(|c| c.id != conversation_id);
        if state.conversations.len() == before {
            return Err(ParleyError::api(404, "Conversation not found"));
        }
        state.messages.remove(conversation_id);
        Ok(())
    }

    async fn list_messages(&self, token: &str, conversation_id: &str) -> Result<Vec<Message>> {
        let mut state = self.state.lock().unwrap();
        state.record("list_messages")?;
        Self::check_token(token)?;
        Ok(state
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        token: &str,
        outbound: OutboundMessage,
    ) -> Result<MessageExchange> {
        let mut state = self.state.lock().unwrap();
        state.record("send_message")?;
        Self::check_token(token)?;

        if !state
            .conversations
            .iter()
            .any(|c| c.id == outbound.conversation_id)
        {
            return Err(ParleyError::api(404, "Conversation not found"));
        }
        state.last_send_conversation_id = Some(outbound.conversation_id.clone());

        let has_image = outbound
            .attachment
            .as_ref()
            .is_some_and(|a| a.is_image());
        let user_message = Message {
            id: state.next_id("m"),
            conversation_id: outbound.conversation_id.clone(),
            role: Role::User,
            content: outbound.text.clone(),
            created_at: Utc::now(),
            has_image,
            image_data: None,
        };
        let assistant_message = Message {
            id: state.next_id("m"),
            conversation_id: outbound.conversation_id.clone(),
            role: Role::Assistant,
            content: format!("Echo: {}", outbound.text),
            created_at: Utc::now(),
            has_image: false,
            image_data: None,
        };

        let entry = state
            .messages
            .entry(outbound.conversation_id.clone())
            .or_default();
        entry.push(user_message.clone());
        entry.push(assistant_message.clone());

        // The exchange bumps the thread to the head, as the server's
        // newest-first ordering would.
        if let Some(position) = state
            .conversations
            .iter()
            .position(|c| c.id == outbound.conversation_id)
        {
            let mut conversation = state.conversations.remove(position);
            conversation.updated_at = Utc::now();
            state.conversations.insert(0, conversation);
        }

        Ok(MessageExchange {
            user_message,
            assistant_message,
        })
    }
}

/// In-memory [`SessionStore`].
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    /// Pre-populates the store, as if a previous run had persisted `token`.
    pub fn seed(&self, token: &str) {
        *self.session.lock().unwrap() = Some(Session {
            token: token.to_string(),
            user: test_user(),
        });
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}
