//! Scoring strategies and their registry.
//!
//! A strategy turns a validated choice list plus application context into a
//! `ScoredAnswer`. The registry binds (app type, strategy kind) pairs to
//! strategy instances once at construction; there is no request-time
//! registration.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{fingerprint, serialize_choices, ResponseCache};
use crate::error::ScoreError;
use crate::model::{AppType, ResultTier, ScoredAnswer, ScoringContext, StrategyKind};
use crate::resolver::resolve_tier;
use crate::traits::{
    extract_json_object, scoring_user_prompt, ChatProvider, ChatRequest, SCORING_SYSTEM_PROMPT,
};

/// Max tokens requested for a judge verdict.
const SCORING_MAX_TOKENS: u32 = 1024;

/// Computes a scored answer from raw choices and application context.
///
/// `tiers` is the application's result-tier table; strategies that derive
/// their verdict elsewhere ignore it.
#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    async fn score(
        &self,
        choices: &[String],
        ctx: &ScoringContext,
        tiers: &[ResultTier],
    ) -> Result<ScoredAnswer, ScoreError>;
}

/// Shared input validation: choices must be non-empty and positionally
/// aligned with the question list.
fn validate_choices(choices: &[String], ctx: &ScoringContext) -> Result<(), ScoreError> {
    if choices.is_empty() {
        return Err(ScoreError::InvalidInput("choices must not be empty".into()));
    }
    if choices.len() != ctx.questions.len() {
        return Err(ScoreError::InvalidInput(format!(
            "got {} choices for {} questions",
            choices.len(),
            ctx.questions.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Custom-score strategy
// ---------------------------------------------------------------------------

/// Weight-summing strategy for graded applications.
pub struct CustomScoreStrategy;

#[async_trait]
impl ScoringStrategy for CustomScoreStrategy {
    async fn score(
        &self,
        choices: &[String],
        ctx: &ScoringContext,
        tiers: &[ResultTier],
    ) -> Result<ScoredAnswer, ScoreError> {
        validate_choices(choices, ctx)?;

        // Sum the weight of each option whose key matches the submitted
        // choice. An unmatched choice contributes nothing; only structural
        // problems are fatal.
        let mut total = 0i32;
        for (question, choice) in ctx.questions.iter().zip(choices) {
            for option in &question.options {
                if option.key == *choice {
                    total += option.score;
                }
            }
        }

        let tier = resolve_tier(tiers, total)?;

        Ok(ScoredAnswer {
            app_id: ctx.app.id,
            app_type: ctx.app.app_type,
            strategy: ctx.strategy,
            choices: serialize_choices(choices),
            result_id: tier.id,
            result_name: tier.result_name.clone(),
            result_desc: tier.result_desc.clone(),
            result_picture: tier.result_picture.clone(),
            result_score: Some(total),
        })
    }
}

// ---------------------------------------------------------------------------
// Model-assisted strategy
// ---------------------------------------------------------------------------

/// The verdict shape the judge prompt mandates, and the exact payload stored
/// in the response cache.
#[derive(Debug, Serialize, Deserialize)]
struct VerdictPayload {
    #[serde(rename = "resultName")]
    result_name: String,
    #[serde(rename = "resultDesc")]
    result_desc: String,
}

/// Model-judged strategy for assessment applications, with response caching.
///
/// The cache is injected so independent instances (and tests) own isolated
/// caches; nothing here is process-global.
pub struct ModelAssistedStrategy {
    provider: Arc<dyn ChatProvider>,
    cache: Arc<ResponseCache>,
    model: String,
}

impl ModelAssistedStrategy {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        cache: Arc<ResponseCache>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            cache,
            model: model.into(),
        }
    }

    fn answer_from_verdict(
        &self,
        verdict: VerdictPayload,
        ctx: &ScoringContext,
        serialized_choices: String,
    ) -> ScoredAnswer {
        // Identity fields are call-specific and never part of the cached
        // payload; they are re-attached on every return path.
        ScoredAnswer {
            app_id: ctx.app.id,
            app_type: ctx.app.app_type,
            strategy: ctx.strategy,
            choices: serialized_choices,
            result_id: None,
            result_name: verdict.result_name,
            result_desc: verdict.result_desc,
            result_picture: None,
            result_score: None,
        }
    }
}

#[async_trait]
impl ScoringStrategy for ModelAssistedStrategy {
    async fn score(
        &self,
        choices: &[String],
        ctx: &ScoringContext,
        _tiers: &[ResultTier],
    ) -> Result<ScoredAnswer, ScoreError> {
        validate_choices(choices, ctx)?;

        let serialized = serialize_choices(choices);
        let key = fingerprint(ctx.app.id, &serialized);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(app_id = ctx.app.id, "verdict cache hit");
            let verdict: VerdictPayload = serde_json::from_str(&cached)
                .map_err(|e| ScoreError::ParseFailure(format!("cached verdict: {e}")))?;
            return Ok(self.answer_from_verdict(verdict, ctx, serialized));
        }

        let request = ChatRequest {
            model: self.model.clone(),
            system_prompt: SCORING_SYSTEM_PROMPT.to_string(),
            user_prompt: scoring_user_prompt(ctx, choices),
            max_tokens: SCORING_MAX_TOKENS,
            temperature: 0.0,
        };
        let response = self
            .provider
            .chat(&request)
            .await
            .map_err(|e| ScoreError::UpstreamFailure(format!("{e:#}")))?;

        let json = extract_json_object(&response.content).ok_or_else(|| {
            ScoreError::ParseFailure("no balanced object in model output".into())
        })?;
        let verdict: VerdictPayload = serde_json::from_str(json)
            .map_err(|e| ScoreError::ParseFailure(format!("unexpected verdict shape: {e}")))?;

        // Written only after a fully successful round trip; a failed call
        // never poisons the cache.
        self.cache.put(key, json);

        Ok(self.answer_from_verdict(verdict, ctx, serialized))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Static mapping from (app type, strategy kind) to a strategy instance.
pub struct StrategyRegistry {
    bindings: HashMap<(AppType, StrategyKind), Arc<dyn ScoringStrategy>>,
}

impl StrategyRegistry {
    /// An empty registry, for callers assembling a custom binding set.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The stock bindings: graded applications score by option weight,
    /// assessment applications go through the model judge.
    pub fn with_defaults(
        provider: Arc<dyn ChatProvider>,
        cache: Arc<ResponseCache>,
        model: impl Into<String>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(
            AppType::Graded,
            StrategyKind::CustomScore,
            Arc::new(CustomScoreStrategy),
        );
        registry.register(
            AppType::Assessment,
            StrategyKind::ModelAssisted,
            Arc::new(ModelAssistedStrategy::new(provider, cache, model)),
        );
        registry
    }

    /// Bind a strategy. Config-time only: the registry is shared immutably
    /// once scoring starts.
    pub fn register(
        &mut self,
        app_type: AppType,
        strategy: StrategyKind,
        implementation: Arc<dyn ScoringStrategy>,
    ) {
        self.bindings.insert((app_type, strategy), implementation);
    }

    /// Resolve the strategy for an (app type, strategy kind) pair.
    pub fn resolve(
        &self,
        app_type: AppType,
        strategy: StrategyKind,
    ) -> Result<Arc<dyn ScoringStrategy>, ScoreError> {
        self.bindings
            .get(&(app_type, strategy))
            .cloned()
            .ok_or(ScoreError::UnsupportedStrategy { app_type, strategy })
    }

    /// Scoring entry point: dispatch to the registered strategy.
    pub async fn score(
        &self,
        choices: &[String],
        ctx: &ScoringContext,
        tiers: &[ResultTier],
    ) -> Result<ScoredAnswer, ScoreError> {
        let strategy = self.resolve(ctx.app.app_type, ctx.strategy)?;
        strategy.score(choices, ctx, tiers).await
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
