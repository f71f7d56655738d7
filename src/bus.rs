use crate::chat::{ChatMessage, MoodLogEntry};
use crate::entity::AuthState;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum Event {
    /// A message was appended to the conversation
    MessageAppended(ChatMessage),

    /// The session entered or left the sending state
    PendingChanged(bool),

    /// The mood history panel was (re)loaded; `visible` is the panel state at that moment
    HistoryUpdated {
        entries: Vec<MoodLogEntry>,
        visible: bool,
    },

    /// The identity provider reported a new state
    AuthChanged(AuthState),

    /// The user should be taken to another screen (e.g. "/login" after sign-out)
    Navigate(String),
}

pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) {
        // We ignore the error if there are no receivers
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
