//! Chat session state machine.
//!
//! A session is either idle or sending. `send_message` appends the user's
//! text, asks the backend for a recommendation and appends exactly one
//! assistant reply whatever the outcome, then returns to idle.

use crate::bus::{Event, EventBus};
use crate::chat::{ChatMessage, ChatSession, EMPTY_REPLY_FALLBACK, NETWORK_ERROR_FALLBACK};
use crate::identity::IdentityProvider;
use crate::transport::Backend;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// How the assistant reply of a completed send was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The backend returned a recommendation
    Answer,
    /// The backend answered without a usable result
    Fallback,
    /// The request failed
    NetworkError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// Another send is in flight, nothing happened
    Busy,
    /// Both the user message and a reply were appended
    Completed { reply: Reply, text: String },
}

pub struct SessionStore {
    backend: Arc<dyn Backend>,
    identity: Arc<dyn IdentityProvider>,
    bus: Arc<EventBus>,
    state: Mutex<ChatSession>,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn Backend>,
        identity: Arc<dyn IdentityProvider>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            backend,
            identity,
            bus,
            state: Mutex::new(ChatSession::seeded()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ChatSession {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Send `text` to the backend and record the exchange.
    ///
    /// Never fails: transport errors become a fixed assistant message.
    /// Only one send may be in flight; a concurrent call returns
    /// [`SendOutcome::Busy`] without touching the session.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(_pending) = self.begin_send(text) else {
            debug!("Send rejected, another request is in flight");
            return SendOutcome::Busy;
        };

        let email = self.identity.current_user().map(|user| user.email);
        let (reply, reply_text) = match self.backend.recommend(text, email.as_deref()).await {
            Ok(Some(result)) if !result.is_empty() => (Reply::Answer, result),
            Ok(_) => (Reply::Fallback, EMPTY_REPLY_FALLBACK.to_string()),
            Err(e) => {
                warn!("Recommendation request failed: {}", e);
                (Reply::NetworkError, NETWORK_ERROR_FALLBACK.to_string())
            }
        };

        self.append(ChatMessage::assistant(reply_text.clone()));
        SendOutcome::Completed {
            reply,
            text: reply_text,
        }
    }

    /// Append the user message and enter the sending state, unless already sending.
    fn begin_send(&self, text: &str) -> Option<PendingGuard<'_>> {
        let mut state = self.lock();
        if state.pending {
            return None;
        }
        let message = ChatMessage::user(text);
        state.messages.push(message.clone());
        self.bus.publish(Event::MessageAppended(message));
        state.pending = true;
        self.bus.publish(Event::PendingChanged(true));
        Some(PendingGuard { store: self })
    }

    fn append(&self, message: ChatMessage) {
        let mut state = self.lock();
        state.messages.push(message.clone());
        self.bus.publish(Event::MessageAppended(message));
    }
}

/// Returns the store to idle when dropped, including when the send is cancelled.
struct PendingGuard<'a> {
    store: &'a SessionStore,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.pending = false;
        self.store.bus.publish(Event::PendingChanged(false));
    }
}
