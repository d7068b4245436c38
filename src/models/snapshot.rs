use crate::models::repo::RepoData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeStructure {
    pub functions: u64,
    pub classes: u64,
    pub avg_function_length: f64,
    pub max_nesting_depth: u32,
    pub imports: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub cyclomatic_complexity: f64,
    pub maintainability_index: f64,
    pub lines_of_code: u64,
    /// Fraction of commented lines, 0.0–1.0.
    pub comment_ratio: f64,
    pub halstead_difficulty: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitMetrics {
    pub total_commits: u64,
    pub recent_commits: u64,
    pub avg_commit_message_length: f64,
    pub unique_contributors: u64,
    pub branches: u64,
    pub has_conventional_commits: bool,
}

/// Everything the scoring engine is allowed to look at. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    repo: RepoData,
    structure: CodeStructure,
    metrics: CodeMetrics,
    git: GitMetrics,
}

impl AnalysisSnapshot {
    pub fn new(repo: RepoData, structure: CodeStructure, metrics: CodeMetrics, git: GitMetrics) -> Self {
        Self {
            repo,
            structure,
            metrics,
            git,
        }
    }

    pub fn repo(&self) -> &RepoData {
        &self.repo
    }

    pub fn structure(&self) -> &CodeStructure {
        &self.structure
    }

    pub fn metrics(&self) -> &CodeMetrics {
        &self.metrics
    }

    pub fn git(&self) -> &GitMetrics {
        &self.git
    }
}
