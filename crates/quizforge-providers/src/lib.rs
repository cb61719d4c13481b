//! quizforge-providers — Chat model provider integrations.
//!
//! Implements the `ChatProvider` trait for ZhiPu GLM and OpenAI-compatible
//! backends, plus a mock provider for tests.

pub mod config;
pub mod mock;
pub mod openai;
pub mod sse;
pub mod zhipu;

pub use config::{create_provider, load_config, ProviderConfig, QuizforgeConfig};
pub use quizforge_core::error::ProviderError;
