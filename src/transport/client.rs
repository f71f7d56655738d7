use crate::chat::MoodLogEntry;
use crate::entity::Sender;
use crate::error::{LogKind, TransportError};
use crate::transport::api::{
    ChatLogRequest, MealLogRequest, MoodLogRequest, RecommendRequest, RecommendResponse,
    SymptomLogRequest,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// The backend calls the chat session and history panel depend on.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask for a recommendation. `Ok(None)` means the backend answered without a result.
    async fn recommend(
        &self,
        message: &str,
        user_email: Option<&str>,
    ) -> Result<Option<String>, TransportError>;

    async fn mood_logs(&self, user_email: &str) -> Result<Vec<MoodLogEntry>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> Result<Self, TransportError> {
        // No timeout: a send waits as long as the backend does.
        let http = reqwest::Client::builder()
            .user_agent(concat!("ayurvati/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        endpoint_url(&self.base_url, segments)
    }

    async fn post_log<B: Serialize + ?Sized>(
        &self,
        kind: LogKind,
        body: &B,
    ) -> Result<Value, TransportError> {
        let segments: Vec<&str> = kind.path().trim_start_matches('/').split('/').collect();
        let url = self.endpoint(&segments)?;
        debug!("-> POST {}", url);

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("{} log rejected with {}", kind, status);
            return Err(TransportError::LogRejected { kind, status });
        }
        Ok(response.json::<Value>().await?)
    }

    pub async fn log_chat(
        &self,
        user_email: &str,
        message: &str,
        sender: Sender,
    ) -> Result<Value, TransportError> {
        let body = ChatLogRequest {
            user_email,
            message,
            sender: sender.as_str(),
        };
        self.post_log(LogKind::Chat, &body).await
    }

    pub async fn log_mood(
        &self,
        user_email: &str,
        mood: &str,
        intensity: i64,
    ) -> Result<Value, TransportError> {
        let body = MoodLogRequest {
            user_email,
            mood,
            intensity,
        };
        self.post_log(LogKind::Mood, &body).await
    }

    pub async fn log_symptom(
        &self,
        user_email: &str,
        symptom: &str,
        severity: i64,
    ) -> Result<Value, TransportError> {
        let body = SymptomLogRequest {
            user_email,
            symptom,
            severity,
        };
        self.post_log(LogKind::Symptom, &body).await
    }

    pub async fn log_meal(
        &self,
        user_email: &str,
        meal_type: &str,
        items: &[String],
    ) -> Result<Value, TransportError> {
        let body = MealLogRequest {
            user_email,
            meal_type,
            items,
        };
        self.post_log(LogKind::Meal, &body).await
    }
}

#[async_trait]
impl Backend for HttpTransport {
    async fn recommend(
        &self,
        message: &str,
        user_email: Option<&str>,
    ) -> Result<Option<String>, TransportError> {
        let url = self.endpoint(&["recommend"])?;
        debug!("-> POST {}", url);

        let response = self
            .http
            .post(url)
            .json(&RecommendRequest {
                message,
                user_email,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body: RecommendResponse = response.json().await?;
        Ok(body.result)
    }

    async fn mood_logs(&self, user_email: &str) -> Result<Vec<MoodLogEntry>, TransportError> {
        let url = self.endpoint(&["logs", "mood", user_email])?;
        debug!("-> GET {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }
        Ok(response.json().await?)
    }
}

/// Append path segments to the base url, percent-encoding each one.
fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
