//! The `quizforge score` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quizforge_core::cache::ResponseCache;
use quizforge_core::model::ScoringContext;
use quizforge_core::strategy::StrategyRegistry;
use quizforge_providers::config::load_config_from;

use super::{build_provider, AppFile};

pub async fn execute(
    app_path: PathBuf,
    choices: Vec<String>,
    provider_name: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!choices.is_empty(), "at least one choice is required");

    let config = load_config_from(config_path.as_deref())?;
    let app_file = AppFile::load(&app_path)?;

    let provider: Arc<dyn quizforge_core::traits::ChatProvider> =
        Arc::from(build_provider(&config, provider_name.as_deref())?);
    let cache = Arc::new(config.response_cache());
    let model = model.unwrap_or_else(|| config.default_model.clone());
    let registry = StrategyRegistry::with_defaults(provider, cache, model);

    let ctx = ScoringContext {
        app: app_file.app,
        strategy: app_file.strategy,
        questions: app_file.questions,
    };

    let answer = registry.score(&choices, &ctx, &app_file.tiers).await?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}
