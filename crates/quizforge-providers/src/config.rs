//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizforge_core::cache::ResponseCache;
use quizforge_core::traits::ChatProvider;

use crate::openai::OpenAiProvider;
use crate::zhipu::ZhipuProvider;

/// Configuration for a single chat provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Zhipu {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Zhipu {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Zhipu")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
        }
    }
}

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Verdict cache sizing hint.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Verdict cache idle expiration in seconds.
    #[serde(default = "default_cache_idle_secs")]
    pub cache_idle_secs: u64,
}

fn default_provider() -> String {
    "zhipu".to_string()
}
fn default_model() -> String {
    "glm-4-flash".to_string()
}
fn default_cache_capacity() -> usize {
    1024
}
fn default_cache_idle_secs() -> u64 {
    300
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            cache_capacity: default_cache_capacity(),
            cache_idle_secs: default_cache_idle_secs(),
        }
    }
}

impl QuizforgeConfig {
    /// Build the verdict cache this configuration describes.
    pub fn response_cache(&self) -> ResponseCache {
        ResponseCache::new(self.cache_capacity, Duration::from_secs(self.cache_idle_secs))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Zhipu { api_key, base_url } => ProviderConfig::Zhipu {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_ZHIPU_KEY`, `QUIZFORGE_OPENAI_KEY`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizforge.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizforgeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("QUIZFORGE_ZHIPU_KEY") {
        config
            .providers
            .entry("zhipu".into())
            .or_insert(ProviderConfig::Zhipu {
                api_key: String::new(),
                base_url: None,
            });
        if let Some(ProviderConfig::Zhipu { api_key, .. }) = config.providers.get_mut("zhipu") {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("QUIZFORGE_OPENAI_KEY") {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn ChatProvider>> {
    match config {
        ProviderConfig::Zhipu { api_key, base_url } => {
            Ok(Box::new(ZhipuProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Box::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZFORGE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZFORGE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZFORGE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_QUIZFORGE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = QuizforgeConfig::default();
        assert_eq!(config.default_provider, "zhipu");
        assert_eq!(config.default_model, "glm-4-flash");
        assert_eq!(config.cache_capacity, 1024);
        assert_eq!(config.cache_idle_secs, 300);
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "zhipu"
default_model = "glm-4-flash"
cache_idle_secs = 60

[providers.zhipu]
type = "zhipu"
api_key = "sk-test"

[providers.openai]
type = "openai"
api_key = "sk-openai"
org_id = "org-123"
"#;
        let config: QuizforgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert!(matches!(
            config.providers.get("zhipu"),
            Some(ProviderConfig::Zhipu { .. })
        ));
        assert_eq!(config.cache_idle_secs, 60);
    }

    #[test]
    fn debug_masks_api_keys() {
        let config = ProviderConfig::Zhipu {
            api_key: "super-secret".to_string(),
            base_url: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn create_provider_builds_each_variant() {
        let zhipu = create_provider(&ProviderConfig::Zhipu {
            api_key: "k".into(),
            base_url: None,
        })
        .unwrap();
        assert_eq!(zhipu.name(), "zhipu");

        let openai = create_provider(&ProviderConfig::OpenAI {
            api_key: "k".into(),
            base_url: None,
            org_id: None,
        })
        .unwrap();
        assert_eq!(openai.name(), "openai");
    }
}
