//! Identity provider adapter.
//!
//! The chat session and history panel only ever read the current user from
//! here. Sign-in and sign-out are driven by the presentation layer.

use crate::config::{Config, SIGN_IN_ROUTE};
use crate::entity::{AuthState, UserIdentity};
use crate::error::AuthError;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<UserIdentity>;

    /// Change notifications for the authentication state.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    /// Sign in and return the route to navigate to afterwards.
    async fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<String, AuthError>;

    /// Sign out and return the route of the sign-in screen.
    async fn sign_out(&self) -> String;
}

/// Identity backed by local configuration instead of a hosted auth service.
pub struct LocalIdentityProvider {
    state: watch::Sender<AuthState>,
    sign_in_redirect: String,
}

impl LocalIdentityProvider {
    pub fn new(sign_in_redirect: impl Into<String>) -> Self {
        let (state, _rx) = watch::channel(AuthState::Resolving);
        Self {
            state,
            sign_in_redirect: sign_in_redirect.into(),
        }
    }

    /// Build the provider and resolve it from the configured user, if any.
    pub fn from_config(config: &Config) -> Self {
        let provider = Self::new(config.sign_in_redirect.clone());
        let user = config.user_email.as_ref().map(|email| {
            let name = config
                .display_name
                .clone()
                .unwrap_or_else(|| default_display_name(email));
            let user = UserIdentity::new(email.clone(), name);
            match &config.photo_url {
                Some(url) => user.with_photo_url(url.clone()),
                None => user,
            }
        });
        provider.resolve(user);
        provider
    }

    /// Finish the initial `Resolving` phase.
    pub fn resolve(&self, user: Option<UserIdentity>) {
        let next = match user {
            Some(user) => AuthState::SignedIn(user),
            None => AuthState::SignedOut,
        };
        self.state.send_replace(next);
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user().cloned()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn sign_in(&self, email: &str, display_name: Option<&str>) -> Result<String, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        if !looks_like_email(email) {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }

        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_display_name(email));
        let user = UserIdentity::new(email, name);
        info!("Signed in as {}", user);
        self.state.send_replace(AuthState::SignedIn(user));

        Ok(self.sign_in_redirect.clone())
    }

    async fn sign_out(&self) -> String {
        self.state.send_replace(AuthState::SignedOut);
        info!("Signed out");
        SIGN_IN_ROUTE.to_string()
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
