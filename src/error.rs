//! Error types shared by the transport and identity layers.

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Which logging endpoint a request was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Chat,
    Mood,
    Symptom,
    Meal,
}

impl LogKind {
    pub fn path(&self) -> &'static str {
        match self {
            LogKind::Chat => "/log/chat",
            LogKind::Mood => "/log/mood",
            LogKind::Symptom => "/log/symptom",
            LogKind::Meal => "/log/meal",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogKind::Chat => "chat",
            LogKind::Mood => "mood",
            LogKind::Symptom => "symptom",
            LogKind::Meal => "meal",
        };
        f.write_str(name)
    }
}

/// Failure of a single HTTP exchange with the backend.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, body read or JSON decoding failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("backend returned {0}")]
    Status(StatusCode),

    /// A logging endpoint refused the entry
    #[error("Failed to log {kind}")]
    LogRejected { kind: LogKind, status: StatusCode },

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

/// Sign-in failures surfaced to the user as a blocking alert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no email given")]
    MissingEmail,

    #[error("'{0}' is not an email address")]
    InvalidEmail(String),
}
