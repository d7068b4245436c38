use crate::models::insight::Insight;
use crate::models::score::ScoreReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished analysis: what the result cache stores and what polling returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub report: ScoreReport,
    pub insight: Insight,
    pub repo_name: String,
    pub repo_url: String,
    pub analyzed_at: DateTime<Utc>,
}
