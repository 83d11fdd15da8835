//! Application layer for Parley.
//!
//! Three cooperating controllers, composed top-down: the session manager
//! owns authentication state, the conversation list controller owns the
//! thread list and selection, and the message exchange controller owns the
//! rendered message list and the optimistic send protocol. All of them are
//! written against the `ChatApi` and `SessionStore` seams from
//! `parley-core`, so they run unchanged against the HTTP client or an
//! in-memory fake.

pub mod conversations;
pub mod exchange;
pub mod session_manager;

#[cfg(test)]
pub(crate) mod testing;

pub use conversations::{ConversationListController, RemovalOutcome};
pub use exchange::{MessageExchangeController, SendOutcome};
pub use session_manager::SessionManager;
