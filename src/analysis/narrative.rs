use crate::models::insight::{GeneratedBy, Insight, RoadmapItem, MAX_ROADMAP_ITEMS};
use crate::models::score::{Dimension, DimensionScore, ScoreReport};
use crate::models::snapshot::AnalysisSnapshot;
use std::cmp::Ordering;

const README_PREVIEW_CHARS: usize = 500;
const FILE_SAMPLE: usize = 5;

/// Roadmap tie-break order for dimensions with equal score ratios.
const ROADMAP_TIE_ORDER: [Dimension; 8] = [
    Dimension::CodeQuality,
    Dimension::Architecture,
    Dimension::Documentation,
    Dimension::Testing,
    Dimension::Security,
    Dimension::GitWorkflow,
    Dimension::RealWorld,
    Dimension::Innovation,
];

/// Builds the narrative prompt from computed statistics only. Source code is
/// never included; the README contributes at most a short preview.
pub fn build_prompt(snapshot: &AnalysisSnapshot, report: &ScoreReport) -> String {
    let repo = snapshot.repo();
    let metrics = snapshot.metrics();
    let git = snapshot.git();

    let languages: Vec<&str> = repo.languages.keys().map(String::as_str).collect();
    let files: Vec<&str> = repo
        .file_structure
        .file_names
        .iter()
        .take(FILE_SAMPLE)
        .map(String::as_str)
        .collect();
    let readme_preview: String = repo.readme.chars().take(README_PREVIEW_CHARS).collect();

    let dimension_lines: String = report
        .dimensions
        .iter()
        .map(|(dimension, score)| {
            format!(
                "- {}: {}/{} ({})\n",
                dimension.label(),
                score.score,
                score.max_score,
                score.signals.join("; ")
            )
        })
        .collect();

    format!(
        "You are a senior engineer reviewing a repository. Give feedback specific to the data below.\n\n\
         Repository: {name}\n\
         URL: {url}\n\
         Description: {description}\n\
         Languages: {languages}\n\
         Stars: {stars} | Forks: {forks} | Contributors: {contributors}\n\
         Top-level files: {files}\n\n\
         Overall score: {total}/{max} ({level}), percentile {percentile}\n\
         Dimension scores:\n\
         {dimension_lines}\n\
         Key metrics:\n\
         - Complexity: {complexity}\n\
         - Maintainability: {maintainability}\n\
         - Comments: {comments:.1}%\n\
         - Commits: {commits} (recent: {recent})\n\n\
         README preview:\n\
         {readme_preview}\n\n\
         Respond with JSON only, using exactly these keys: \
         {{\"summary\": \"2-3 sentences that cite a specific file or signal\", \
         \"roadmap\": [{{\"item\": \"concrete next step\", \"reason\": \"why it helps\"}}]}}. \
         Give at most {MAX_ROADMAP_ITEMS} roadmap entries.",
        name = repo.name,
        url = repo.url,
        description = repo.description,
        languages = languages.join(", "),
        stars = repo.stars,
        forks = repo.forks,
        contributors = repo.contributors,
        files = files.join(", "),
        total = report.total_score,
        max = report.max_score,
        level = report.skill_level,
        percentile = report.percentile,
        complexity = metrics.cyclomatic_complexity,
        maintainability = metrics.maintainability_index,
        comments = metrics.comment_ratio * 100.0,
        commits = git.total_commits,
        recent = git.recent_commits,
    )
}

/// Deterministic narrative built from the report alone. Cannot fail.
pub fn synthesize(report: &ScoreReport) -> Insight {
    Insight {
        summary: summary_for(report),
        roadmap: roadmap_for(report),
        generated_by: GeneratedBy::RuleBasedFallback,
    }
}

fn summary_for(report: &ScoreReport) -> String {
    let score = report.total_score;
    let level = report.skill_level;
    match score {
        80.. => format!(
            "Scoring {score}/100 ({level}), this repository reflects mature engineering habits. \
             Code quality is high and the layout is easy to navigate. \
             It reads like work from an experienced team."
        ),
        60.. => format!(
            "Scoring {score}/100 ({level}), this repository has solid fundamentals. \
             Stronger tests and fuller documentation would take it to a professional level."
        ),
        40.. => format!(
            "Scoring {score}/100 ({level}), this repository shows working competence. \
             The foundation is there; cleaner code and better documentation would make the biggest difference."
        ),
        _ => format!(
            "Scoring {score}/100 ({level}), this repository is an early start. \
             Concentrate on readable code and a clear README, then build a steady commit habit."
        ),
    }
}

/// Weakest dimensions first, by `score / max_score`; equal ratios follow [`ROADMAP_TIE_ORDER`].
fn roadmap_for(report: &ScoreReport) -> Vec<RoadmapItem> {
    let mut ranked: Vec<(Dimension, &DimensionScore)> = ROADMAP_TIE_ORDER
        .iter()
        .filter_map(|dimension| report.dimension(*dimension).map(|score| (*dimension, score)))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| compare_ratio(a, b));

    ranked
        .into_iter()
        .take(MAX_ROADMAP_ITEMS)
        .map(|(dimension, _)| suggestion_for(dimension))
        .collect()
}

fn compare_ratio(a: &DimensionScore, b: &DimensionScore) -> Ordering {
    let left = u64::from(a.score) * u64::from(b.max_score.max(1));
    let right = u64::from(b.score) * u64::from(a.max_score.max(1));
    left.cmp(&right)
}

fn suggestion_for(dimension: Dimension) -> RoadmapItem {
    let (item, reason) = match dimension {
        Dimension::CodeQuality => (
            "Break up complex functions and tighten naming",
            "Smaller, clearer units are cheaper to read and change",
        ),
        Dimension::Documentation => (
            "Expand the README with setup and usage sections",
            "New users and reviewers need a working path from clone to first run",
        ),
        Dimension::Testing => (
            "Add unit tests around the core logic",
            "Tests catch regressions and make refactoring safe",
        ),
        Dimension::Security => (
            "Validate inputs, handle errors explicitly and add a license",
            "Production code has to fail safely and state its terms of use",
        ),
        Dimension::GitWorkflow => (
            "Adopt conventional commit messages and small focused commits",
            "A readable history documents how the project evolved",
        ),
        Dimension::Architecture => (
            "Separate concerns into clearly named modules and folders",
            "A predictable layout keeps the codebase maintainable as it grows",
        ),
        Dimension::RealWorld => (
            "Document deployment and add production configuration",
            "Shows the project can run outside a development machine",
        ),
        Dimension::Innovation => (
            "Push one feature beyond the obvious implementation",
            "Distinctive solutions demonstrate technical depth",
        ),
    };
    RoadmapItem {
        item: item.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::repo::RepoData;
    use crate::models::snapshot::{CodeMetrics, CodeStructure, GitMetrics};
    use std::collections::BTreeMap;

    fn report_from(scores: &[(Dimension, u32)]) -> ScoreReport {
        let dimensions: BTreeMap<Dimension, DimensionScore> = scores
            .iter()
            .map(|(dimension, score)| {
                (
                    *dimension,
                    DimensionScore {
                        score: *score,
                        max_score: dimension.max_score(),
                        signals: vec![format!("{dimension} signal")],
                        formula: String::new(),
                    },
                )
            })
            .collect();
        ScoreReport::from_dimensions(dimensions)
    }

    fn full_marks() -> Vec<(Dimension, u32)> {
        Dimension::ALL.iter().map(|d| (*d, d.max_score())).collect()
    }

    #[test]
    fn summary_bracket_follows_total() {
        let strong = synthesize(&report_from(&full_marks()));
        assert!(strong.summary.starts_with("Scoring 100/100 (Expert)"));
        assert!(strong.summary.contains("mature engineering habits"));

        let weak = synthesize(&report_from(&[(Dimension::Security, 5)]));
        assert!(weak.summary.contains("early start"));
        assert_eq!(weak.generated_by, GeneratedBy::RuleBasedFallback);
    }

    #[test]
    fn roadmap_lists_weakest_dimensions_first() {
        let mut scores = full_marks();
        scores[2] = (Dimension::Testing, 0);
        scores[5] = (Dimension::Architecture, 6);

        let roadmap = synthesize(&report_from(&scores)).roadmap;
        assert_eq!(roadmap.len(), MAX_ROADMAP_ITEMS);
        assert_eq!(roadmap[0], suggestion_for(Dimension::Testing));
        assert_eq!(roadmap[1], suggestion_for(Dimension::Architecture));
        // Remaining full-score dimensions follow the tie-break order.
        assert_eq!(roadmap[2], suggestion_for(Dimension::CodeQuality));
        assert_eq!(roadmap[3], suggestion_for(Dimension::Documentation));
        assert_eq!(roadmap[4], suggestion_for(Dimension::Security));
    }

    #[test]
    fn fully_tied_roadmap_puts_architecture_second() {
        let roadmap = synthesize(&report_from(&full_marks())).roadmap;
        let expected: Vec<RoadmapItem> = [
            Dimension::CodeQuality,
            Dimension::Architecture,
            Dimension::Documentation,
            Dimension::Testing,
            Dimension::Security,
        ]
        .into_iter()
        .map(suggestion_for)
        .collect();
        assert_eq!(roadmap, expected);
    }

    #[test]
    fn equal_ratios_across_different_maxima_tie() {
        // 9/18 == 6/12: code quality stays ahead of architecture.
        let mut scores = full_marks();
        scores[0] = (Dimension::CodeQuality, 9);
        scores[5] = (Dimension::Architecture, 6);

        let roadmap = synthesize(&report_from(&scores)).roadmap;
        assert_eq!(roadmap[0], suggestion_for(Dimension::CodeQuality));
        assert_eq!(roadmap[1], suggestion_for(Dimension::Architecture));
    }

    #[test]
    fn prompt_carries_statistics_but_bounded_readme() {
        let mut repo = RepoData {
            name: "demo".to_string(),
            readme: "r".repeat(2_000),
            ..RepoData::default()
        };
        repo.file_structure.file_names = (0..8).map(|i| format!("file{i}.rs")).collect();
        let snapshot = AnalysisSnapshot::new(
            repo,
            CodeStructure::default(),
            CodeMetrics::default(),
            GitMetrics::default(),
        );
        let report = report_from(&full_marks());

        let prompt = build_prompt(&snapshot, &report);
        assert!(prompt.contains("Overall score: 100/100 (Expert)"));
        assert!(prompt.contains("file4.rs"));
        assert!(!prompt.contains("file5.rs"));
        assert!(prompt.contains(&"r".repeat(500)));
        assert!(!prompt.contains(&"r".repeat(501)));
        assert!(prompt.contains("Key metrics:\n- Complexity: "));
        assert_eq!(prompt.matches("/18 (").count(), 1);
        assert!(prompt.ends_with("Give at most 5 roadmap entries."));
    }
}
