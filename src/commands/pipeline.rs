use crate::analysis::scoring::ScoringEngine;
use crate::analysis::signals::SignalSource;
use crate::error::AnalysisError;
use crate::models::analysis::AnalysisResult;
use crate::models::repo::RepoId;
use crate::models::snapshot::AnalysisSnapshot;
use crate::services::insight::{InsightContext, InsightFallbackChain};
use crate::services::RepositoryProvider;
use chrono::Utc;
use std::sync::Arc;

/// Published progress checkpoints, in order.
pub const STAGES: [(u8, &str); 6] = [
    (10, "Fetching repository data..."),
    (30, "Analyzing code structure..."),
    (50, "Calculating code quality metrics..."),
    (70, "Analyzing git workflow..."),
    (80, "Calculating scores..."),
    (90, "Generating insights..."),
];

/// The six sequential analysis stages for one repository.
pub struct AnalysisPipeline {
    repos: Arc<dyn RepositoryProvider>,
    signals: Arc<dyn SignalSource>,
    insights: InsightFallbackChain,
    scoring: ScoringEngine,
}

impl AnalysisPipeline {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        signals: Arc<dyn SignalSource>,
        insights: InsightFallbackChain,
    ) -> Self {
        Self {
            repos,
            signals,
            insights,
            scoring: ScoringEngine,
        }
    }

    pub fn repositories(&self) -> &Arc<dyn RepositoryProvider> {
        &self.repos
    }

    /// Runs every stage, reporting each checkpoint through `progress`
    /// before the stage starts. Only the fetch stage can fail.
    pub async fn run<F>(&self, repo: &RepoId, mut progress: F) -> Result<AnalysisResult, AnalysisError>
    where
        F: FnMut(u8, &str) + Send,
    {
        let [fetch, structure, metrics, git, score, insight] = STAGES;

        progress(fetch.0, fetch.1);
        let data = self.repos.fetch_repository(repo).await?;

        progress(structure.0, structure.1);
        let code_structure = self.signals.structure(&data);

        progress(metrics.0, metrics.1);
        let code_metrics = self.signals.metrics(&data);

        progress(git.0, git.1);
        let git_metrics = self.signals.git(repo, &data);

        progress(score.0, score.1);
        let snapshot = AnalysisSnapshot::new(data, code_structure, code_metrics, git_metrics);
        let report = self.scoring.calculate(&snapshot);

        progress(insight.0, insight.1);
        let key = repo.key();
        let narrative = self
            .insights
            .generate(&InsightContext {
                key: &key,
                snapshot: &snapshot,
                report: &report,
            })
            .await;

        log::info!(
            "Analysis completed for {key}: {}/{}",
            report.total_score,
            report.max_score
        );
        Ok(AnalysisResult {
            repo_name: snapshot.repo().name.clone(),
            repo_url: key,
            report,
            insight: narrative,
            analyzed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::signals::HeuristicSignals;
    use crate::models::insight::GeneratedBy;
    use crate::models::repo::RepoData;
    use async_trait::async_trait;

    struct StaticRepos(Result<RepoData, AnalysisError>);

    #[async_trait]
    impl RepositoryProvider for StaticRepos {
        async fn fetch_repository(&self, _repo: &RepoId) -> Result<RepoData, AnalysisError> {
            self.0.clone()
        }

        async fn rate_limit_remaining(&self) -> Result<u64, AnalysisError> {
            Ok(5000)
        }
    }

    fn pipeline(fetch: Result<RepoData, AnalysisError>) -> AnalysisPipeline {
        AnalysisPipeline::new(
            Arc::new(StaticRepos(fetch)),
            Arc::new(HeuristicSignals),
            InsightFallbackChain::rule_based_only(),
        )
    }

    #[tokio::test]
    async fn reports_checkpoints_in_order() {
        let repo = RepoId::parse("https://github.com/a/b").expect("valid url");
        let data = RepoData {
            name: "b".to_string(),
            size: 12,
            ..RepoData::default()
        };
        let mut seen = Vec::new();

        let result = pipeline(Ok(data))
            .run(&repo, |progress, _| seen.push(progress))
            .await
            .expect("analysis succeeds");

        assert_eq!(seen, vec![10, 30, 50, 70, 80, 90]);
        assert_eq!(result.repo_name, "b");
        assert_eq!(result.repo_url, "https://github.com/a/b");
        assert_eq!(result.insight.generated_by, GeneratedBy::RuleBasedFallback);
        let sum: u32 = result.report.dimensions.values().map(|d| d.score).sum();
        assert_eq!(result.report.total_score, sum);
    }

    #[tokio::test]
    async fn fetch_failure_stops_after_first_stage() {
        let repo = RepoId::parse("https://github.com/a/missing").expect("valid url");
        let mut seen = Vec::new();

        let err = pipeline(Err(AnalysisError::NotFound(
            "Repository not found or is private: a/missing".to_string(),
        )))
        .run(&repo, |progress, _| seen.push(progress))
        .await
        .unwrap_err();

        assert_eq!(seen, vec![10]);
        assert_eq!(err.to_string(), "Repository not found or is private: a/missing");
    }
}
