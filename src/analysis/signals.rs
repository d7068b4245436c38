use crate::analysis::{history, metrics, structure};
use crate::models::repo::{RepoData, RepoId};
use crate::models::snapshot::{CodeMetrics, CodeStructure, GitMetrics};

/// Source of the structural, metric and history signals fed to scoring.
pub trait SignalSource: Send + Sync {
    fn structure(&self, repo: &RepoData) -> CodeStructure;
    fn metrics(&self, repo: &RepoData) -> CodeMetrics;
    fn git(&self, id: &RepoId, repo: &RepoData) -> GitMetrics;
}

/// Metadata-only estimates; no source code is downloaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSignals;

impl SignalSource for HeuristicSignals {
    fn structure(&self, repo: &RepoData) -> CodeStructure {
        structure::estimate_structure(repo)
    }

    fn metrics(&self, repo: &RepoData) -> CodeMetrics {
        metrics::estimate_metrics(repo)
    }

    fn git(&self, id: &RepoId, _repo: &RepoData) -> GitMetrics {
        history::estimate_git_metrics(id)
    }
}
