use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl Sender {
    /// Wire tag used by the chat log endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "ai",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.into(),
            photo_url: None,
        }
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.email)
    }
}

/// Current authentication state as published by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Provider has not reported yet.
    Resolving,
    SignedIn(UserIdentity),
    SignedOut,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_serializes_to_backend_tags() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Assistant).unwrap(), "\"ai\"");
        assert_eq!(Sender::Assistant.to_string(), "ai");
    }

    #[test]
    fn only_signed_in_state_exposes_a_user() {
        let user = UserIdentity::new("a@b.c", "Asha").with_photo_url("https://x/p.png");
        assert_eq!(AuthState::SignedIn(user.clone()).user(), Some(&user));
        assert!(AuthState::Resolving.user().is_none());
        assert!(AuthState::SignedOut.user().is_none());
        assert_eq!(user.to_string(), "Asha (a@b.c)");
    }
}
