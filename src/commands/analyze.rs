use crate::commands::pipeline::AnalysisPipeline;
use crate::error::AnalysisError;
use crate::models::repo::RepoId;
use crate::models::task::Task;
use crate::store::cache::ResultCache;
use crate::store::tasks::{TaskError, TaskTracker};
use serde::Serialize;
use std::sync::Arc;

const OFFLINE_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedAnalysis {
    pub task_id: String,
    pub cached: bool,
    pub message: String,
}

/// Request-side orchestration: cache short-circuit, offline gate, and the
/// detached background run.
#[derive(Clone)]
pub struct AnalysisService {
    tasks: Arc<dyn TaskTracker>,
    results: Arc<dyn ResultCache>,
    pipeline: Arc<AnalysisPipeline>,
    offline: bool,
}

impl AnalysisService {
    pub fn new(
        tasks: Arc<dyn TaskTracker>,
        results: Arc<dyn ResultCache>,
        pipeline: Arc<AnalysisPipeline>,
        offline: bool,
    ) -> Self {
        Self {
            tasks,
            results,
            pipeline,
            offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }

    pub fn cached_repos(&self) -> usize {
        self.results.size()
    }

    /// Validates `repo_url` and either answers from the cache or starts a
    /// background analysis. Never waits for the analysis itself.
    pub fn start(&self, repo_url: &str) -> Result<StartedAnalysis, AnalysisError> {
        let repo = RepoId::parse(repo_url)?;
        let key = repo.key();

        if let Some(result) = self.results.get(&key) {
            log::info!("Using cached result for {key}");
            let task_id = self
                .tasks
                .create_completed(result, "Analysis complete (cached)");
            return Ok(StartedAnalysis {
                task_id,
                cached: true,
                message: "Using cached result".to_string(),
            });
        }

        if self.offline {
            return Err(AnalysisError::Offline {
                available: self.results.keys(OFFLINE_SUGGESTIONS),
            });
        }

        let task_id = self.tasks.create();
        log::info!("Starting analysis {task_id} for {key}");
        tokio::spawn(run_detached(
            self.tasks.clone(),
            self.results.clone(),
            self.pipeline.clone(),
            repo,
            task_id.clone(),
        ));

        Ok(StartedAnalysis {
            message: format!("Analysis started. Poll /api/progress/{task_id} for updates"),
            task_id,
            cached: false,
        })
    }

    pub fn progress(&self, task_id: &str) -> Result<Task, TaskError> {
        self.tasks.get(task_id)
    }
}

/// One background analysis. Reports only through the tracker and the cache.
async fn run_detached(
    tasks: Arc<dyn TaskTracker>,
    results: Arc<dyn ResultCache>,
    pipeline: Arc<AnalysisPipeline>,
    repo: RepoId,
    task_id: String,
) {
    let tracker = tasks.clone();
    let id = task_id.clone();
    let outcome = pipeline
        .run(&repo, move |progress, message| {
            if let Err(err) = tracker.advance(&id, progress, message) {
                log::debug!("Progress update dropped: {err}");
            }
        })
        .await;

    match outcome {
        Ok(result) => {
            // The store writes its file synchronously; keep that off the async workers.
            let key = repo.key();
            let stored = result.clone();
            let cache = results.clone();
            if let Err(err) = tokio::task::spawn_blocking(move || cache.put(&key, stored)).await {
                log::warn!("Result cache write for {} did not finish: {err}", repo.key());
            }
            if let Err(err) = tasks.complete(&task_id, result) {
                log::warn!("Could not complete task {task_id}: {err}");
            }
        }
        Err(err) => {
            log::error!("Analysis failed for {}: {err}", repo.key());
            if let Err(update) = tasks.fail(&task_id, &err.to_string()) {
                log::warn!("Could not mark task {task_id} failed: {update}");
            }
        }
    }
}
