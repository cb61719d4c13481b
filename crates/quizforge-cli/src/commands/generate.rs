//! The `quizforge generate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quizforge_core::generate::{generate_questions, stream_questions, GenerationSignal};
use quizforge_providers::config::load_config_from;

use super::{build_provider, AppFile};

pub async fn execute(
    app_path: PathBuf,
    question_count: u32,
    option_count: u32,
    stream: bool,
    provider_name: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(question_count >= 1, "question count must be at least 1");
    anyhow::ensure!(option_count >= 2, "option count must be at least 2");

    let config = load_config_from(config_path.as_deref())?;
    let app_file = AppFile::load(&app_path)?;
    let provider = build_provider(&config, provider_name.as_deref())?;
    let model = model.unwrap_or_else(|| config.default_model.clone());

    if stream {
        let provider: Arc<dyn quizforge_core::traits::ChatProvider> = Arc::from(provider);
        let mut signals = stream_questions(
            provider,
            model,
            app_file.app,
            question_count,
            option_count,
        );

        let mut emitted = 0usize;
        while let Some(signal) = signals.recv().await {
            match signal {
                GenerationSignal::Item(event) => {
                    // One escaped line per item, as a push transport would send it.
                    println!("{}", event.sse_payload());
                    emitted += 1;
                }
                GenerationSignal::Completed => {
                    eprintln!("Complete: {emitted} items");
                    return Ok(());
                }
                GenerationSignal::Failed(e) => {
                    return Err(e.into());
                }
            }
        }
        anyhow::bail!("generation stream ended without a terminal signal");
    }

    let questions = generate_questions(
        provider.as_ref(),
        &model,
        &app_file.app,
        question_count,
        option_count,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&questions)?);
    Ok(())
}
