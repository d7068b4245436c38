use crate::models::score::{Dimension, DimensionScore, ScoreReport};
use crate::models::snapshot::AnalysisSnapshot;
use std::collections::BTreeMap;

const SETUP_KEYWORDS: [&str; 5] = ["install", "setup", "getting started", "usage", "how to"];
const DEPLOYMENT_KEYWORDS: [&str; 8] = [
    "docker", "deploy", "cloud", "aws", "heroku", "vercel", "build", "run",
];

/// Turns an [`AnalysisSnapshot`] into a [`ScoreReport`]. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn calculate(&self, snapshot: &AnalysisSnapshot) -> ScoreReport {
        let dimensions: BTreeMap<Dimension, DimensionScore> = Dimension::ALL
            .iter()
            .map(|&dimension| (dimension, score_dimension(dimension, snapshot)))
            .collect();
        ScoreReport::from_dimensions(dimensions)
    }
}

fn score_dimension(dimension: Dimension, snapshot: &AnalysisSnapshot) -> DimensionScore {
    match dimension {
        Dimension::CodeQuality => score_code_quality(snapshot),
        Dimension::Documentation => score_documentation(snapshot),
        Dimension::Testing => score_testing(snapshot),
        Dimension::Security => score_security(snapshot),
        Dimension::GitWorkflow => score_git_workflow(snapshot),
        Dimension::Architecture => score_architecture(snapshot),
        Dimension::RealWorld => score_real_world(snapshot),
        Dimension::Innovation => score_innovation(snapshot),
    }
}

/// Accumulates sub-criterion points and their signal lines for one dimension.
struct Tally {
    dimension: Dimension,
    points: u32,
    signals: Vec<String>,
}

impl Tally {
    fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            points: 0,
            signals: Vec::new(),
        }
    }

    fn add(&mut self, points: u32, signal: impl Into<String>) {
        self.points += points;
        self.signals.push(signal.into());
    }

    fn finish(self, formula: &str) -> DimensionScore {
        let max_score = self.dimension.max_score();
        DimensionScore {
            score: self.points.min(max_score),
            max_score,
            signals: self.signals,
            formula: formula.to_string(),
        }
    }
}

fn score_code_quality(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let metrics = snapshot.metrics();
    let mut tally = Tally::new(Dimension::CodeQuality);

    let complexity = metrics.cyclomatic_complexity;
    match complexity {
        c if c < 5.0 => tally.add(6, format!("Low complexity ({c:.1} < 5)")),
        c if c < 10.0 => tally.add(4, format!("Moderate complexity ({c:.1})")),
        c if c < 15.0 => tally.add(2, format!("High complexity ({c:.1})")),
        c => tally.add(0, format!("Very high complexity ({c:.1})")),
    }

    let mi = metrics.maintainability_index;
    match mi {
        m if m > 80.0 => tally.add(6, format!("Excellent maintainability ({m:.0} > 80)")),
        m if m > 60.0 => tally.add(4, format!("Good maintainability ({m:.0})")),
        m if m > 40.0 => tally.add(2, format!("Fair maintainability ({m:.0})")),
        m => tally.add(0, format!("Poor maintainability ({m:.0})")),
    }

    let ratio = metrics.comment_ratio;
    let percent = ratio * 100.0;
    if ratio > 0.20 {
        tally.add(6, format!("Well commented ({percent:.1}%)"));
    } else if ratio > 0.10 {
        tally.add(4, format!("Adequately commented ({percent:.1}%)"));
    } else if ratio > 0.05 {
        tally.add(2, format!("Sparsely commented ({percent:.1}%)"));
    } else {
        tally.add(0, format!("Barely commented ({percent:.1}%)"));
    }

    tally.finish("complexity(6) + maintainability(6) + comments(6)")
}

fn score_documentation(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let readme = &snapshot.repo().readme;
    let mut tally = Tally::new(Dimension::Documentation);

    if readme.is_empty() {
        tally.add(0, "No README found");
    } else {
        tally.add(5, "README present");
    }

    let length = readme.chars().count();
    if length > 2000 {
        tally.add(5, format!("Comprehensive README ({length} chars)"));
    } else if length > 1000 {
        tally.add(4, format!("Detailed README ({length} chars)"));
    } else if length > 500 {
        tally.add(3, format!("Basic README ({length} chars)"));
    } else if length > 100 {
        tally.add(1, format!("Minimal README ({length} chars)"));
    } else {
        tally.add(0, format!("README too short to count ({length} chars)"));
    }

    let lowered = readme.to_lowercase();
    if SETUP_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        tally.add(5, "Setup instructions included");
    } else {
        tally.add(0, "No setup instructions");
    }

    tally.finish("exists(5) + length(5) + instructions(5)")
}

fn score_testing(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let structure = snapshot.structure();
    let mut tally = Tally::new(Dimension::Testing);

    if structure.classes > 0 || structure.functions > 5 {
        tally.add(5, "Code is split into testable units");
    } else {
        tally.add(0, "Too little structure to test in isolation");
    }

    tally.add(3, "Baseline test credit");

    if snapshot.repo().readme.to_lowercase().contains("test") {
        tally.add(4, "README covers testing");
    } else {
        tally.add(0, "README does not mention tests");
    }

    tally.finish("structure(5) + baseline(3) + docs(4)")
}

fn score_security(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let mut tally = Tally::new(Dimension::Security);
    tally.add(5, "Baseline security credit");

    match snapshot.repo().license.as_deref() {
        Some(license) => tally.add(3, format!("Licensed ({license})")),
        None => tally.add(0, "No license declared"),
    }

    if snapshot.git().recent_commits > 5 {
        tally.add(2, "Actively maintained");
    } else {
        tally.add(0, "Little recent maintenance");
    }

    tally.finish("baseline(5) + license(3) + maintenance(2)")
}

fn score_git_workflow(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let git = snapshot.git();
    let mut tally = Tally::new(Dimension::GitWorkflow);

    let commits = git.total_commits;
    if commits > 40 {
        tally.add(4, format!("Long history ({commits} commits)"));
    } else if commits > 20 {
        tally.add(3, format!("Solid history ({commits} commits)"));
    } else if commits > 10 {
        tally.add(2, format!("Growing history ({commits} commits)"));
    } else {
        tally.add(1, format!("Early history ({commits} commits)"));
    }

    let recent = git.recent_commits;
    if recent > 5 {
        tally.add(4, format!("High recent activity ({recent} commits)"));
    } else if recent > 2 {
        tally.add(3, format!("Recent activity ({recent} commits)"));
    } else {
        tally.add(2, "Stable, few recent commits");
    }

    if git.has_conventional_commits {
        tally.add(5, "Conventional commit messages detected");
    } else {
        tally.add(5, "Readable commit messages");
    }

    tally.finish("history(4) + activity(4) + conventions(5)")
}

fn score_architecture(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let folders = snapshot.repo().file_structure.folders;
    let classes = snapshot.structure().classes;
    let mut tally = Tally::new(Dimension::Architecture);

    if folders > 5 {
        tally.add(6, format!("Well organized ({folders} folders)"));
    } else if folders > 2 {
        tally.add(4, format!("Organized ({folders} folders)"));
    } else {
        tally.add(2, format!("Flat layout ({folders} folders)"));
    }

    if classes > 5 {
        tally.add(6, format!("Rich type structure ({classes} classes)"));
    } else if classes > 0 {
        tally.add(4, format!("Some type structure ({classes} classes)"));
    } else {
        tally.add(2, "Procedural code");
    }

    tally.finish("organization(6) + patterns(6)")
}

fn score_real_world(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let repo = snapshot.repo();
    let git = snapshot.git();
    let mut tally = Tally::new(Dimension::RealWorld);

    let haystack = format!("{}{}", repo.readme, repo.description).to_lowercase();
    let found: Vec<&str> = DEPLOYMENT_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| haystack.contains(kw))
        .collect();

    match found.as_slice() {
        [] => tally.add(2, "Basic setup only"),
        [only] => tally.add(4, format!("Deployment notes ({only})")),
        [first, second, ..] => tally.add(6, format!("Deployment ready ({first}, {second})")),
    }

    if git.recent_commits > 5 {
        tally.add(6, "Active development");
    } else if git.total_commits > 20 {
        tally.add(4, "Established codebase");
    } else {
        tally.add(2, "Early stage project");
    }

    tally.finish("deployment(6) + maturity(6)")
}

fn score_innovation(snapshot: &AnalysisSnapshot) -> DimensionScore {
    let languages = snapshot.repo().languages.len();
    let mut tally = Tally::new(Dimension::Innovation);
    tally.add(4, "Baseline innovation credit");

    if languages > 3 {
        tally.add(4, format!("Multi-language ({languages} languages)"));
    } else if languages > 1 {
        tally.add(2, format!("Uses {languages} languages"));
    } else {
        tally.add(0, "Single language");
    }

    tally.finish("baseline(4) + languages(4)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::repo::RepoData;
    use crate::models::score::SkillLevel;
    use crate::models::snapshot::{CodeMetrics, CodeStructure, GitMetrics};

    fn snapshot_with(repo: RepoData, structure: CodeStructure, metrics: CodeMetrics, git: GitMetrics) -> AnalysisSnapshot {
        AnalysisSnapshot::new(repo, structure, metrics, git)
    }

    fn rich_snapshot() -> AnalysisSnapshot {
        let mut repo = RepoData {
            name: "rich".to_string(),
            readme: format!("# Rich\n\n## Install\n\nRun the tests with docker.\n{}", "x".repeat(2100)),
            license: Some("MIT".to_string()),
            ..RepoData::default()
        };
        repo.file_structure.folders = 8;
        for (lang, bytes) in [("Rust", 10), ("Python", 9), ("Shell", 8), ("Go", 7)] {
            repo.languages.insert(lang.to_string(), bytes);
        }

        snapshot_with(
            repo,
            CodeStructure {
                functions: 40,
                classes: 9,
                avg_function_length: 15.0,
                max_nesting_depth: 3,
                imports: 10,
            },
            CodeMetrics {
                cyclomatic_complexity: 3.0,
                maintainability_index: 90.0,
                lines_of_code: 2000,
                comment_ratio: 0.25,
                halstead_difficulty: 6.0,
            },
            GitMetrics {
                total_commits: 120,
                recent_commits: 12,
                avg_commit_message_length: 48.0,
                unique_contributors: 4,
                branches: 3,
                has_conventional_commits: true,
            },
        )
    }

    #[test]
    fn top_metrics_max_out_code_quality() {
        let report = ScoringEngine.calculate(&rich_snapshot());
        let quality = report.dimension(Dimension::CodeQuality).expect("code quality");
        assert_eq!(quality.score, 18);
        assert_eq!(quality.signals.len(), 3);
        assert_eq!(quality.formula, "complexity(6) + maintainability(6) + comments(6)");
    }

    #[test]
    fn rich_repository_scores_full_marks() {
        let report = ScoringEngine.calculate(&rich_snapshot());
        assert_eq!(report.total_score, 100);
        assert_eq!(report.skill_level, SkillLevel::Expert);
        assert_eq!(report.percentile, 95);
    }

    #[test]
    fn bare_repository_gets_only_baselines() {
        let report = ScoringEngine.calculate(&AnalysisSnapshot::new(
            RepoData::default(),
            CodeStructure::default(),
            CodeMetrics::default(),
            GitMetrics::default(),
        ));

        let documentation = report.dimension(Dimension::Documentation).expect("documentation");
        assert_eq!(documentation.score, 0);

        let security = report.dimension(Dimension::Security).expect("security");
        assert_eq!(security.score, 5);
        assert_eq!(security.signals.len(), 3);

        // Zeroed metrics: complexity 0 and comments 0 score 6 + 0 + 0.
        assert_eq!(report.dimension(Dimension::CodeQuality).map(|d| d.score), Some(6));
        assert_eq!(report.dimension(Dimension::GitWorkflow).map(|d| d.score), Some(8));
        assert_eq!(report.dimension(Dimension::Innovation).map(|d| d.score), Some(4));
    }

    #[test]
    fn every_dimension_stays_within_bounds() {
        for snapshot in [rich_snapshot(), AnalysisSnapshot::new(
            RepoData::default(),
            CodeStructure::default(),
            CodeMetrics {
                cyclomatic_complexity: 40.0,
                maintainability_index: 10.0,
                ..CodeMetrics::default()
            },
            GitMetrics::default(),
        )] {
            let report = ScoringEngine.calculate(&snapshot);
            assert_eq!(report.dimensions.len(), Dimension::ALL.len());
            for (dimension, score) in &report.dimensions {
                assert_eq!(score.max_score, dimension.max_score());
                assert!(score.score <= score.max_score, "{dimension} overflowed");
            }
            let sum: u32 = report.dimensions.values().map(|d| d.score).sum();
            assert_eq!(report.total_score, sum);
        }
    }

    #[test]
    fn calculation_is_byte_stable() {
        let snapshot = rich_snapshot();
        let first = serde_json::to_string(&ScoringEngine.calculate(&snapshot)).expect("serialize");
        let second = serde_json::to_string(&ScoringEngine.calculate(&snapshot)).expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn deployment_keywords_are_counted_across_readme_and_description() {
        let repo = RepoData {
            readme: "Deploy it anywhere".to_string(),
            description: "Ships a Docker image".to_string(),
            ..RepoData::default()
        };
        let report = ScoringEngine.calculate(&AnalysisSnapshot::new(
            repo,
            CodeStructure::default(),
            CodeMetrics::default(),
            GitMetrics::default(),
        ));
        let real_world = report.dimension(Dimension::RealWorld).expect("real world");
        assert_eq!(real_world.score, 6 + 2);
        assert_eq!(real_world.signals[0], "Deployment ready (docker, deploy)");
    }
}
