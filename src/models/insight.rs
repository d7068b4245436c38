use serde::{Deserialize, Serialize};

/// Upper bound on roadmap entries, whichever strategy produced them.
pub const MAX_ROADMAP_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratedBy {
    ExternalModel,
    RuleBasedFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub item: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    pub roadmap: Vec<RoadmapItem>,
    pub generated_by: GeneratedBy,
}
