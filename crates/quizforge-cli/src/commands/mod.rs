//! Subcommand implementations.

pub mod generate;
pub mod init;
pub mod score;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use quizforge_core::model::{AppInfo, QuestionContent, ResultTier, StrategyKind};
use quizforge_providers::{create_provider, ProviderConfig, QuizforgeConfig};

/// On-disk application description consumed by `score` and `generate`.
#[derive(Debug, Deserialize)]
pub struct AppFile {
    pub app: AppInfo,
    pub strategy: StrategyKind,
    #[serde(default)]
    pub questions: Vec<QuestionContent>,
    #[serde(default)]
    pub tiers: Vec<ResultTier>,
}

impl AppFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read application file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse application file: {}", path.display()))
    }
}

/// Build the chat provider named by `--provider` (or the configured
/// default). An unconfigured provider falls back to a keyless stock entry:
/// graded applications never reach the model, so scoring them works without
/// any provider setup.
pub fn build_provider(
    config: &QuizforgeConfig,
    name: Option<&str>,
) -> Result<Box<dyn quizforge_core::traits::ChatProvider>> {
    let name = name.unwrap_or(&config.default_provider);
    match config.providers.get(name) {
        Some(provider_config) => create_provider(provider_config),
        None => {
            tracing::warn!("provider '{name}' not configured, using keyless defaults");
            create_provider(&ProviderConfig::Zhipu {
                api_key: String::new(),
                base_url: None,
            })
        }
    }
}
