use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_TOTAL_SCORE: u32 = 100;

/// The eight scored quality axes, in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CodeQuality,
    Documentation,
    Testing,
    Security,
    GitWorkflow,
    Architecture,
    RealWorld,
    Innovation,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::CodeQuality,
        Dimension::Documentation,
        Dimension::Testing,
        Dimension::Security,
        Dimension::GitWorkflow,
        Dimension::Architecture,
        Dimension::RealWorld,
        Dimension::Innovation,
    ];

    pub fn max_score(self) -> u32 {
        match self {
            Dimension::CodeQuality => 18,
            Dimension::Documentation => 15,
            Dimension::Testing => 12,
            Dimension::Security => 10,
            Dimension::GitWorkflow => 13,
            Dimension::Architecture => 12,
            Dimension::RealWorld => 12,
            Dimension::Innovation => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::CodeQuality => "code_quality",
            Dimension::Documentation => "documentation",
            Dimension::Testing => "testing",
            Dimension::Security => "security",
            Dimension::GitWorkflow => "git_workflow",
            Dimension::Architecture => "architecture",
            Dimension::RealWorld => "real_world",
            Dimension::Innovation => "innovation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::CodeQuality => "Code Quality",
            Dimension::Documentation => "Documentation",
            Dimension::Testing => "Testing",
            Dimension::Security => "Security",
            Dimension::GitWorkflow => "Git Workflow",
            Dimension::Architecture => "Architecture",
            Dimension::RealWorld => "Real-world",
            Dimension::Innovation => "Innovation",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u32,
    pub max_score: u32,
    pub signals: Vec<String>,
    pub formula: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn from_total(total: u32) -> Self {
        match total {
            86.. => SkillLevel::Expert,
            71.. => SkillLevel::Advanced,
            41.. => SkillLevel::Intermediate,
            _ => SkillLevel::Beginner,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed step function; not derived from historical data.
pub fn percentile_for(total: u32) -> u32 {
    match total {
        90.. => 95,
        80.. => 85,
        70.. => 70,
        60.. => 55,
        50.. => 40,
        40.. => 30,
        _ => (total / 2).max(10),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total_score: u32,
    pub max_score: u32,
    pub skill_level: SkillLevel,
    pub percentile: u32,
    pub dimensions: BTreeMap<Dimension, DimensionScore>,
}

impl ScoreReport {
    /// Derives the total, skill level and percentile from the dimension scores.
    pub fn from_dimensions(dimensions: BTreeMap<Dimension, DimensionScore>) -> Self {
        let total_score = dimensions.values().map(|d| d.score).sum();
        Self {
            total_score,
            max_score: MAX_TOTAL_SCORE,
            skill_level: SkillLevel::from_total(total_score),
            percentile: percentile_for(total_score),
            dimensions,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.dimensions.get(&dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_maxima_sum_to_hundred() {
        let total: u32 = Dimension::ALL.iter().map(|d| d.max_score()).sum();
        assert_eq!(total, MAX_TOTAL_SCORE);
    }

    #[test]
    fn skill_level_thresholds() {
        assert_eq!(SkillLevel::from_total(100), SkillLevel::Expert);
        assert_eq!(SkillLevel::from_total(86), SkillLevel::Expert);
        assert_eq!(SkillLevel::from_total(85), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_total(71), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_total(70), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_total(41), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_total(40), SkillLevel::Beginner);
        assert_eq!(SkillLevel::from_total(0), SkillLevel::Beginner);
    }

    #[test]
    fn percentile_breakpoints() {
        assert_eq!(percentile_for(90), 95);
        assert_eq!(percentile_for(80), 85);
        assert_eq!(percentile_for(70), 70);
        assert_eq!(percentile_for(60), 55);
        assert_eq!(percentile_for(50), 40);
        assert_eq!(percentile_for(40), 30);
        assert_eq!(percentile_for(39), 19);
        assert_eq!(percentile_for(12), 10);
        assert_eq!(percentile_for(0), 10);
    }

    #[test]
    fn percentile_never_decreases() {
        let values: Vec<u32> = (0..=MAX_TOTAL_SCORE).map(percentile_for).collect();
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn dimensions_serialize_by_name() {
        let mut dimensions = BTreeMap::new();
        dimensions.insert(
            Dimension::GitWorkflow,
            DimensionScore {
                score: 7,
                max_score: 13,
                signals: vec!["Stable".to_string()],
                formula: "history(4) + activity(4) + conventions(5)".to_string(),
            },
        );
        let report = ScoreReport::from_dimensions(dimensions);
        let value = serde_json::to_value(&report).expect("serialize report");

        assert_eq!(value["dimensions"]["git_workflow"]["score"], 7);
        assert_eq!(value["skill_level"], "Beginner");
        assert_eq!(value["total_score"], 7);
        assert_eq!(value["max_score"], 100);
    }
}
