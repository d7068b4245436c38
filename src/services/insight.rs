use crate::analysis::narrative;
use crate::models::insight::Insight;
use crate::models::score::ScoreReport;
use crate::models::snapshot::AnalysisSnapshot;
use crate::services::NarrativeProvider;
use crate::store::cache::NarrativeCache;
use async_trait::async_trait;
use std::sync::Arc;

/// Inputs shared by every narrative strategy.
pub struct InsightContext<'a> {
    /// Repository identity, the narrative cache key.
    pub key: &'a str,
    pub snapshot: &'a AnalysisSnapshot,
    pub report: &'a ScoreReport,
}

pub enum StrategyOutcome {
    Produced(Insight),
    Continue,
}

#[async_trait]
pub trait InsightStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &InsightContext<'_>) -> StrategyOutcome;
}

/// Returns a previously generated narrative unchanged.
pub struct CachedNarrative {
    cache: Arc<dyn NarrativeCache>,
}

impl CachedNarrative {
    pub fn new(cache: Arc<dyn NarrativeCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl InsightStrategy for CachedNarrative {
    fn name(&self) -> &'static str {
        "narrative cache"
    }

    async fn attempt(&self, ctx: &InsightContext<'_>) -> StrategyOutcome {
        match self.cache.get(ctx.key) {
            Some(insight) => {
                log::info!("Using cached narrative for {}", ctx.key);
                StrategyOutcome::Produced(insight)
            }
            None => StrategyOutcome::Continue,
        }
    }
}

/// Asks the generative-text service and records successful answers.
pub struct ModelNarrative {
    provider: Arc<dyn NarrativeProvider>,
    cache: Arc<dyn NarrativeCache>,
}

impl ModelNarrative {
    pub fn new(provider: Arc<dyn NarrativeProvider>, cache: Arc<dyn NarrativeCache>) -> Self {
        Self { provider, cache }
    }
}

#[async_trait]
impl InsightStrategy for ModelNarrative {
    fn name(&self) -> &'static str {
        "narrative model"
    }

    async fn attempt(&self, ctx: &InsightContext<'_>) -> StrategyOutcome {
        if !self.provider.is_available() {
            return StrategyOutcome::Continue;
        }

        let prompt = narrative::build_prompt(ctx.snapshot, ctx.report);
        match self.provider.generate(&prompt).await {
            Ok(insight) => {
                let cache = self.cache.clone();
                let key = ctx.key.to_string();
                let stored = insight.clone();
                if let Err(err) = tokio::task::spawn_blocking(move || cache.put(&key, stored)).await {
                    log::warn!("Narrative cache write for {} did not finish: {err}", ctx.key);
                }
                StrategyOutcome::Produced(insight)
            }
            Err(err) => {
                log::warn!("Narrative generation failed for {}: {err}", ctx.key);
                StrategyOutcome::Continue
            }
        }
    }
}

/// Ordered narrative strategies ending in the rule-based synthesis, so
/// [`generate`](Self::generate) always returns an [`Insight`].
pub struct InsightFallbackChain {
    strategies: Vec<Box<dyn InsightStrategy>>,
}

impl InsightFallbackChain {
    pub fn new(strategies: Vec<Box<dyn InsightStrategy>>) -> Self {
        Self { strategies }
    }

    /// Cache, then model, then rules.
    pub fn standard(cache: Arc<dyn NarrativeCache>, provider: Arc<dyn NarrativeProvider>) -> Self {
        Self::new(vec![
            Box::new(CachedNarrative::new(cache.clone())),
            Box::new(ModelNarrative::new(provider, cache)),
        ])
    }

    pub fn rule_based_only() -> Self {
        Self::new(Vec::new())
    }

    pub async fn generate(&self, ctx: &InsightContext<'_>) -> Insight {
        for strategy in &self.strategies {
            if let StrategyOutcome::Produced(insight) = strategy.attempt(ctx).await {
                log::debug!("Narrative for {} produced by {}", ctx.key, strategy.name());
                return insight;
            }
        }
        log::info!("Using rule-based narrative for {}", ctx.key);
        narrative::synthesize(ctx.report)
    }
}
