use crate::models::insight::{GeneratedBy, Insight, RoadmapItem, MAX_ROADMAP_ITEMS};
use crate::services::credentials::CredentialPool;
use crate::services::resilient::{CallError, Classify, ErrorClass, ResilientClient};
use crate::services::NarrativeProvider;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const SERVICE: &str = "Gemini";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeminiError {
    #[error("Gemini quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Gemini rejected the API key: {0}")]
    InvalidKey(String),

    #[error("Gemini model not found: {0}")]
    ModelNotFound(String),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gemini request failed: {0}")]
    Network(String),

    #[error("Unusable Gemini reply: {0}")]
    Malformed(String),
}

impl Classify for GeminiError {
    fn classify(&self) -> ErrorClass {
        match self {
            GeminiError::QuotaExhausted(_) | GeminiError::InvalidKey(_) => ErrorClass::Exhausted,
            GeminiError::ModelNotFound(_) => ErrorClass::NotFound,
            GeminiError::Api { .. } | GeminiError::Network(_) | GeminiError::Malformed(_) => {
                ErrorClass::Transient
            }
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeminiError::Malformed(err.to_string())
        } else {
            GeminiError::Network(err.to_string())
        }
    }
}

/// Google error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Shape the prompt asks the model to answer with.
#[derive(Debug, Deserialize)]
struct NarrativeReply {
    summary: String,
    #[serde(default)]
    roadmap: Vec<RoadmapItem>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    resilient: ResilientClient,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        pool: Arc<CredentialPool>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        if pool.is_empty() {
            log::warn!("No Gemini API key configured; narratives will use the rule-based fallback");
        } else {
            log::info!("Gemini client initialized with {} key(s)", pool.len());
        }
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            resilient: ResilientClient::new(SERVICE, pool).with_deadline(timeout),
        })
    }

    async fn generate_once(&self, prompt: &str, key: Option<String>) -> Result<Insight, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": TEMPERATURE,
            },
        });

        let mut request = self.http.post(url).json(&body);
        if let Some(key) = key.as_deref() {
            request = request.header("x-goog-api-key", key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let reply: GenerateResponse = response.json().await?;
        let text = reply
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect::<String>();
        if text.trim().is_empty() {
            return Err(GeminiError::Malformed("reply contained no text".to_string()));
        }
        parse_narrative(&text)
    }
}

#[async_trait]
impl NarrativeProvider for GeminiClient {
    fn is_available(&self) -> bool {
        !self.resilient.pool().is_empty()
    }

    async fn generate(&self, prompt: &str) -> Result<Insight, CallError> {
        self.resilient
            .call(|key| self.generate_once(prompt, key))
            .await
    }
}

fn classify_failure(status: StatusCode, body: &str) -> GeminiError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status.unwrap_or_default()),
        Err(_) => (body.to_string(), String::new()),
    };
    let key_rejected = message.to_lowercase().contains("api key not valid")
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED";

    match status {
        StatusCode::TOO_MANY_REQUESTS => GeminiError::QuotaExhausted(message),
        _ if api_status == "RESOURCE_EXHAUSTED" => GeminiError::QuotaExhausted(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeminiError::InvalidKey(message),
        _ if key_rejected => GeminiError::InvalidKey(message),
        StatusCode::NOT_FOUND => GeminiError::ModelNotFound(message),
        other => GeminiError::Api {
            status: other.as_u16(),
            message,
        },
    }
}

/// Parses the model's JSON answer, tolerating a surrounding markdown fence.
fn parse_narrative(text: &str) -> Result<Insight, GeminiError> {
    let trimmed = strip_code_fence(text.trim());
    let reply: NarrativeReply =
        serde_json::from_str(trimmed).map_err(|err| GeminiError::Malformed(err.to_string()))?;
    if reply.summary.trim().is_empty() {
        return Err(GeminiError::Malformed("empty summary".to_string()));
    }

    let mut roadmap = reply.roadmap;
    roadmap.truncate(MAX_ROADMAP_ITEMS);
    Ok(Insight {
        summary: reply.summary,
        roadmap,
        generated_by: GeneratedBy::ExternalModel,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
