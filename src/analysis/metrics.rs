use crate::models::repo::RepoData;
use crate::models::snapshot::CodeMetrics;

const BASELINE_COMPLEXITY: f64 = 5.0;
const BASELINE_MAINTAINABILITY: f64 = 85.0;

/// Code-quality metrics assumed from metadata until real analysis exists.
pub fn estimate_metrics(repo: &RepoData) -> CodeMetrics {
    let comment_ratio = (0.15 + repo.stars as f64 / 10_000.0).min(1.0);

    CodeMetrics {
        cyclomatic_complexity: BASELINE_COMPLEXITY,
        maintainability_index: BASELINE_MAINTAINABILITY,
        lines_of_code: 500 + repo.stars * 10,
        comment_ratio: round_to(comment_ratio, 3),
        halstead_difficulty: BASELINE_COMPLEXITY * 2.0,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstarred_repository_uses_baselines() {
        let metrics = estimate_metrics(&RepoData::default());
        assert_eq!(metrics.cyclomatic_complexity, 5.0);
        assert_eq!(metrics.maintainability_index, 85.0);
        assert_eq!(metrics.lines_of_code, 500);
        assert_eq!(metrics.comment_ratio, 0.15);
        assert_eq!(metrics.halstead_difficulty, 10.0);
    }

    #[test]
    fn comment_ratio_is_capped() {
        let repo = RepoData {
            stars: 250_000,
            ..RepoData::default()
        };
        let metrics = estimate_metrics(&repo);
        assert_eq!(metrics.comment_ratio, 1.0);
        assert_eq!(metrics.lines_of_code, 2_500_500);
    }
}
