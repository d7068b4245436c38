pub mod credentials;
pub mod gemini;
pub mod github;
pub mod insight;
pub mod resilient;

use crate::error::AnalysisError;
use crate::models::insight::Insight;
use crate::models::repo::{RepoData, RepoId};
use async_trait::async_trait;
use resilient::CallError;

/// Code-hosting service that supplies repository metadata.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    async fn fetch_repository(&self, repo: &RepoId) -> Result<RepoData, AnalysisError>;

    /// Remaining core API quota for the active credential.
    async fn rate_limit_remaining(&self) -> Result<u64, AnalysisError>;
}

/// Generative-text service that writes the narrative for a finished score.
#[async_trait]
pub trait NarrativeProvider: Send + Sync {
    /// False when no credential is configured; callers skip the service entirely.
    fn is_available(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<Insight, CallError>;
}
