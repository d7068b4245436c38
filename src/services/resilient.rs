use crate::error::AnalysisError;
use crate::services::credentials::CredentialPool;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// How a service error affects the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Quota or credential problem; another credential may succeed.
    Exhausted,
    /// The resource does not exist; no credential can fix that.
    NotFound,
    /// Anything else. Not retried.
    Transient,
}

/// Implemented by every service-specific error that goes through [`ResilientClient`].
pub trait Classify: fmt::Display {
    fn classify(&self) -> ErrorClass;
}

/// Terminal outcome of a resilient call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("{message}")]
    NotFound { service: String, message: String },

    #[error("{service} credentials exhausted after {attempts} attempt(s): {message}")]
    Exhausted {
        service: String,
        attempts: usize,
        message: String,
    },

    #[error("{message}")]
    Transient { service: String, message: String },
}

impl CallError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CallError::NotFound { .. } => ErrorClass::NotFound,
            CallError::Exhausted { .. } => ErrorClass::Exhausted,
            CallError::Transient { .. } => ErrorClass::Transient,
        }
    }
}

impl From<CallError> for AnalysisError {
    fn from(err: CallError) -> Self {
        let message = err.to_string();
        match err.class() {
            ErrorClass::NotFound => AnalysisError::NotFound(message),
            ErrorClass::Exhausted => AnalysisError::Exhausted(message),
            ErrorClass::Transient => AnalysisError::Transient(message),
        }
    }
}

/// Runs one external call with credential rotation on exhaustion.
///
/// With `N` credentials at most `N` attempts are made (one unauthenticated
/// attempt when `N == 0`). Not-found and transient failures end the call
/// immediately; there is no backoff.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    service: String,
    pool: Arc<CredentialPool>,
    deadline: Duration,
}

impl ResilientClient {
    pub fn new(service: impl Into<String>, pool: Arc<CredentialPool>) -> Self {
        Self {
            service: service.into(),
            pool,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Bound on each individual attempt.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    pub async fn call<T, E, F, Fut>(&self, mut op: F) -> Result<T, CallError>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let attempts = self.pool.len().max(1);
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            let credential = self.pool.current().map(str::to_string);
            let err = match tokio::time::timeout(self.deadline, op(credential)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => {
                    log::warn!(
                        "{} call exceeded the {}s deadline",
                        self.service,
                        self.deadline.as_secs_f64()
                    );
                    return Err(CallError::Transient {
                        service: self.service.clone(),
                        message: format!(
                            "{} did not respond within {}s",
                            self.service,
                            self.deadline.as_secs_f64()
                        ),
                    });
                }
            };

            match err.classify() {
                ErrorClass::NotFound => {
                    return Err(CallError::NotFound {
                        service: self.service.clone(),
                        message: err.to_string(),
                    });
                }
                ErrorClass::Transient => {
                    log::warn!("{} call failed: {err}", self.service);
                    return Err(CallError::Transient {
                        service: self.service.clone(),
                        message: err.to_string(),
                    });
                }
                ErrorClass::Exhausted => {
                    log::warn!(
                        "{} credential {}/{} exhausted: {err}",
                        self.service,
                        self.pool.position(),
                        self.pool.len()
                    );
                    last_message = err.to_string();
                    if attempt < attempts {
                        self.pool.rotate();
                        log::info!(
                            "Rotated {} credential to {}/{}",
                            self.service,
                            self.pool.position(),
                            self.pool.len()
                        );
                    }
                }
            }
        }

        Err(CallError::Exhausted {
            service: self.service.clone(),
            attempts,
            message: last_message,
        })
    }
}
