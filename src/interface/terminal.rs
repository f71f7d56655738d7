use crate::{
    bus::{Event, EventBus},
    chat::MoodLogEntry,
    entity::{AuthState, Sender},
    error::TransportError,
    history::HistoryLoader,
    identity::IdentityProvider,
    session::{SendOutcome, SessionStore},
    transport::HttpTransport,
};
use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const HELP: &str = "These commands are supported:
/history                         Show or hide your mood logs.
/mood <mood> <1-10>              Log how you feel.
/symptom <symptom> <1-10>        Log a symptom and its severity.
/meal <type> <item, item, ...>   Log a meal.
/signin <email> [name]           Sign in.
/signout                         Sign out.
/help                            Display this text.
/quit                            Leave.
Anything else is sent to the doctor.";

const SIGN_IN_FAILED: &str = "Sign-in failed. Try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Help,
    History,
    Mood { mood: String, intensity: i64 },
    Symptom { symptom: String, severity: i64 },
    Meal { meal_type: String, items: Vec<String> },
    SignIn { email: String, name: Option<String> },
    SignOut,
    Quit,
    /// A known command with bad arguments; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };

        let (name, args) = match body.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (body, ""),
        };

        match name.to_lowercase().as_str() {
            "help" | "start" => Command::Help,
            "history" => Command::History,
            "quit" | "exit" => Command::Quit,
            "signout" | "logout" => Command::SignOut,
            "signin" | "login" => {
                let mut parts = args.splitn(2, char::is_whitespace);
                match parts.next().filter(|e| !e.is_empty()) {
                    Some(email) => Command::SignIn {
                        email: email.to_string(),
                        name: parts.next().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                    },
                    None => Command::Usage("Usage: /signin <email> [name]"),
                }
            }
            "mood" => match split_scored(args) {
                Some((mood, intensity)) => Command::Mood { mood, intensity },
                None => Command::Usage("Usage: /mood <mood> <1-10>"),
            },
            "symptom" => match split_scored(args) {
                Some((symptom, severity)) => Command::Symptom { symptom, severity },
                None => Command::Usage("Usage: /symptom <symptom> <1-10>"),
            },
            "meal" => {
                let (meal_type, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                let items: Vec<String> = rest
                    .split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                if meal_type.is_empty() || items.is_empty() {
                    Command::Usage("Usage: /meal <type> <item, item, ...>")
                } else {
                    Command::Meal {
                        meal_type: meal_type.to_string(),
                        items,
                    }
                }
            }
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Split "<label words> <score>" where the score is 1-10.
fn split_scored(args: &str) -> Option<(String, i64)> {
    let (label, score) = args.rsplit_once(char::is_whitespace)?;
    let score: i64 = score.parse().ok()?;
    let label = label.trim();
    if label.is_empty() || !(1..=10).contains(&score) {
        return None;
    }
    Some((label.to_string(), score))
}

pub fn format_history(entries: &[MoodLogEntry]) -> String {
    if entries.is_empty() {
        return "Mood Logs\n  No mood logs yet.".to_string();
    }
    let mut out = String::from("Mood Logs");
    for log in entries {
        out.push_str(&format!(
            "\n  {}: {} (intensity {})",
            log.timestamp, log.mood, log.intensity
        ));
    }
    out
}

#[derive(Clone)]
pub struct TerminalInterface {
    bus: Arc<EventBus>,
    session: Arc<SessionStore>,
    history: Arc<HistoryLoader>,
    identity: Arc<dyn IdentityProvider>,
    transport: Arc<HttpTransport>,
    log_chat: bool,
}

impl TerminalInterface {
    pub fn new(
        bus: Arc<EventBus>,
        session: Arc<SessionStore>,
        history: Arc<HistoryLoader>,
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<HttpTransport>,
        log_chat: bool,
    ) -> Self {
        Self {
            bus,
            session,
            history,
            identity,
            transport,
            log_chat,
        }
    }

    pub async fn run(&self) -> Result<()> {
        self.spawn_renderer();
        self.spawn_auth_forwarder();

        for message in self.session.snapshot().messages {
            println!("{}> {}", message.sender, message.text);
        }
        match self.identity.current_user() {
            Some(user) => println!("Signed in as {}. Type /help for commands.", user),
            None => println!("Not signed in. Use /signin <email> to sign in."),
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Command::Quit => break,
                command => self.handle(command).await,
            }
        }

        info!("Input closed, leaving chat");
        Ok(())
    }

    async fn handle(&self, command: Command) {
        match command {
            Command::Say(text) => self.spawn_send(text),
            Command::Help => println!("{}", HELP),
            Command::History => {
                let history = self.history.clone();
                tokio::spawn(async move {
                    if !history.toggle().await {
                        println!("Mood history hidden.");
                    }
                });
            }
            Command::Mood { mood, intensity } => {
                let Some(email) = self.require_email() else { return };
                let transport = self.transport.clone();
                spawn_log(
                    async move { transport.log_mood(&email, &mood, intensity).await },
                    "Mood logged.",
                );
            }
            Command::Symptom { symptom, severity } => {
                let Some(email) = self.require_email() else { return };
                let transport = self.transport.clone();
                spawn_log(
                    async move { transport.log_symptom(&email, &symptom, severity).await },
                    "Symptom logged.",
                );
            }
            Command::Meal { meal_type, items } => {
                let Some(email) = self.require_email() else { return };
                let transport = self.transport.clone();
                spawn_log(
                    async move { transport.log_meal(&email, &meal_type, &items).await },
                    "Meal logged.",
                );
            }
            Command::SignIn { email, name } => {
                match self.identity.sign_in(&email, name.as_deref()).await {
                    Ok(route) => self.bus.publish(Event::Navigate(route)),
                    Err(e) => {
                        warn!("Sign-in failed: {}", e);
                        println!("{}", SIGN_IN_FAILED);
                    }
                }
            }
            Command::SignOut => {
                let route = self.identity.sign_out().await;
                self.bus.publish(Event::Navigate(route));
            }
            Command::Usage(usage) => println!("{}", usage),
            Command::Unknown(name) => println!("Unknown command /{}. Type /help.", name),
            Command::Quit => {}
        }
    }

    fn require_email(&self) -> Option<String> {
        let email = self.identity.current_user().map(|user| user.email);
        if email.is_none() {
            println!("Sign in first: /signin <email>");
        }
        email
    }

    fn spawn_send(&self, text: String) {
        let session = self.session.clone();
        let identity = self.identity.clone();
        let transport = self.transport.clone();
        let log_chat = self.log_chat;

        tokio::spawn(async move {
            match session.send_message(&text).await {
                SendOutcome::Busy => println!("Still thinking about your last message…"),
                SendOutcome::Completed { text: reply, .. } if log_chat => {
                    mirror_exchange(&transport, identity.as_ref(), &text, &reply).await;
                }
                _ => {}
            }
        });
    }

    fn spawn_renderer(&self) {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(line) = render(&event) {
                            println!("{}", line);
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Renderer skipped {} events", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn spawn_auth_forwarder(&self) {
        let mut rx = self.identity.subscribe();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                bus.publish(Event::AuthChanged(state));
            }
        });
    }
}

/// What the terminal prints for a bus event, if anything.
fn render(event: &Event) -> Option<String> {
    match event {
        Event::MessageAppended(message) if message.sender == Sender::Assistant => {
            Some(format!("{}> {}", message.sender, message.text))
        }
        Event::PendingChanged(true) => Some("Thinking…".to_string()),
        Event::HistoryUpdated {
            entries,
            visible: true,
        } => Some(format_history(entries)),
        Event::AuthChanged(AuthState::SignedIn(user)) => Some(format!("Signed in as {}", user)),
        Event::AuthChanged(AuthState::SignedOut) => Some("Signed out.".to_string()),
        Event::Navigate(route) => Some(format!("→ {}", route)),
        _ => None,
    }
}

/// Mirror a completed exchange to the chat log, user text first.
/// Skipped when nobody is signed in; failures are only logged.
async fn mirror_exchange(
    transport: &HttpTransport,
    identity: &dyn IdentityProvider,
    text: &str,
    reply: &str,
) {
    let Some(user) = identity.current_user() else {
        return;
    };
    for (message, sender) in [(text, Sender::User), (reply, Sender::Assistant)] {
        if let Err(e) = transport.log_chat(&user.email, message, sender).await {
            warn!("Chat log mirror failed: {}", e);
        }
    }
}

/// Run a logging call off the input loop and report how it went.
fn spawn_log<F>(call: F, ok: &'static str)
where
    F: Future<Output = Result<Value, TransportError>> + Send + 'static,
{
    tokio::spawn(async move {
        match call.await {
            Ok(_) => println!("{}", ok),
            Err(e) => {
                error!("{}", e);
                println!("{}", e);
            }
        }
    });
}
