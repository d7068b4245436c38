use crate::models::analysis::AnalysisResult;
use crate::models::insight::Insight;
use crate::store::json_map::JsonMapFile;

/// Completed analyses keyed by repository identity.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &str) -> Option<AnalysisResult>;
    /// Last writer wins.
    fn put(&self, key: &str, result: AnalysisResult);
    fn size(&self) -> usize;
    fn keys(&self, limit: usize) -> Vec<String>;
}

/// Generated narratives keyed by repository identity.
pub trait NarrativeCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Insight>;
    fn put(&self, key: &str, insight: Insight);
}

pub type JsonResultCache = JsonMapFile<AnalysisResult>;
pub type JsonNarrativeCache = JsonMapFile<Insight>;

impl ResultCache for JsonMapFile<AnalysisResult> {
    fn get(&self, key: &str) -> Option<AnalysisResult> {
        JsonMapFile::get(self, key)
    }

    fn put(&self, key: &str, result: AnalysisResult) {
        self.insert(key, result);
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn keys(&self, limit: usize) -> Vec<String> {
        JsonMapFile::keys(self, limit)
    }
}

impl NarrativeCache for JsonMapFile<Insight> {
    fn get(&self, key: &str) -> Option<Insight> {
        JsonMapFile::get(self, key)
    }

    fn put(&self, key: &str, insight: Insight) {
        self.insert(key, insight);
    }
}
