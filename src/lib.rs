pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use analysis::signals::HeuristicSignals;
use commands::analyze::AnalysisService;
use commands::http::{build_router, AppState};
use commands::pipeline::AnalysisPipeline;
use commands::settings::Settings;
use services::credentials::CredentialPool;
use services::gemini::GeminiClient;
use services::github::GithubClient;
use services::insight::InsightFallbackChain;
use services::{NarrativeProvider, RepositoryProvider};
use std::sync::Arc;
use store::cache::{JsonNarrativeCache, JsonResultCache};
use store::tasks::InMemoryTaskTracker;
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a process needs, wired from [`Settings`].
pub struct Components {
    pub pipeline: Arc<AnalysisPipeline>,
    pub results: Arc<JsonResultCache>,
    pub narrator: Arc<dyn NarrativeProvider>,
}

impl Components {
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let github_pool = Arc::new(CredentialPool::new(settings.github_tokens.iter().cloned()));
        let gemini_pool = Arc::new(CredentialPool::new(settings.gemini_keys.iter().cloned()));

        let repos: Arc<dyn RepositoryProvider> = Arc::new(GithubClient::new(
            &settings.github_api_url,
            github_pool,
            settings.request_timeout,
        )?);
        let narrator: Arc<dyn NarrativeProvider> = Arc::new(GeminiClient::new(
            &settings.gemini_api_url,
            &settings.gemini_model,
            gemini_pool,
            settings.request_timeout,
        )?);

        let results = Arc::new(JsonResultCache::open(settings.results_path()));
        let narratives = Arc::new(JsonNarrativeCache::open(settings.narratives_path()));
        let insights = InsightFallbackChain::standard(narratives, narrator.clone());
        let pipeline = Arc::new(AnalysisPipeline::new(repos, Arc::new(HeuristicSignals), insights));

        Ok(Self {
            pipeline,
            results,
            narrator,
        })
    }
}

/// Serves the HTTP API until the listener fails.
pub async fn run(settings: Settings) -> Result<(), StartupError> {
    let components = Components::from_settings(&settings)?;
    let service = AnalysisService::new(
        Arc::new(InMemoryTaskTracker::new()),
        components.results.clone(),
        components.pipeline.clone(),
        settings.offline_mode,
    );

    log::info!("GitGrade API starting");
    log::info!("Offline mode: {}", settings.offline_mode);
    log::info!("Cached repositories: {}", service.cached_repos());

    let app = build_router(AppState {
        service,
        narrator: components.narrator,
    });
    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
