//! Question generation against a chat provider.
//!
//! Two entry points: a synchronous variant that parses one complete model
//! response, and a streaming variant that pumps model fragments through a
//! `StreamDecoder` and pushes each completed item to the consumer as it
//! becomes available.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::decoder::StreamDecoder;
use crate::error::ScoreError;
use crate::model::{AppInfo, GenerationEvent, QuestionContent};
use crate::traits::{
    extract_json_array, generation_user_prompt, ChatProvider, ChatRequest, FragmentStream,
    GENERATION_SYSTEM_PROMPT,
};

/// Max tokens requested for a generation run.
const GENERATION_MAX_TOKENS: u32 = 4096;

/// Buffered items between the pump and a slow consumer. The push is ordered
/// and blocking; once the buffer fills, fragment processing waits.
const SINK_BUFFER: usize = 32;

/// What the generation sink receives: zero or more items, then exactly one
/// terminal signal.
#[derive(Debug)]
pub enum GenerationSignal {
    Item(GenerationEvent),
    Completed,
    Failed(ScoreError),
}

fn generation_request(
    model: &str,
    app: &AppInfo,
    question_count: u32,
    option_count: u32,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        system_prompt: GENERATION_SYSTEM_PROMPT.to_string(),
        user_prompt: generation_user_prompt(app, question_count, option_count),
        max_tokens: GENERATION_MAX_TOKENS,
        temperature: 0.7,
    }
}

/// One-shot generation: a single complete model response, the first
/// top-level `[...]` extracted and parsed into question content.
pub async fn generate_questions(
    provider: &dyn ChatProvider,
    model: &str,
    app: &AppInfo,
    question_count: u32,
    option_count: u32,
) -> Result<Vec<QuestionContent>, ScoreError> {
    let request = generation_request(model, app, question_count, option_count);
    let response = provider
        .chat(&request)
        .await
        .map_err(|e| ScoreError::UpstreamFailure(format!("{e:#}")))?;

    let json = extract_json_array(&response.content)
        .ok_or_else(|| ScoreError::ParseFailure("no balanced array in model output".into()))?;
    serde_json::from_str(json)
        .map_err(|e| ScoreError::ParseFailure(format!("unexpected question shape: {e}")))
}

/// Streaming generation: opens the provider stream, spawns the pump on the
/// runtime, and returns the sink end immediately. The channel stays open
/// until the terminal signal; dropping the receiver cancels the pump and
/// releases the upstream subscription.
pub fn stream_questions(
    provider: Arc<dyn ChatProvider>,
    model: String,
    app: AppInfo,
    question_count: u32,
    option_count: u32,
) -> mpsc::Receiver<GenerationSignal> {
    let (sink, consumer) = mpsc::channel(SINK_BUFFER);
    tokio::spawn(async move {
        let request = generation_request(&model, &app, question_count, option_count);
        let fragments = match provider.chat_stream(&request).await {
            Ok(fragments) => fragments,
            Err(e) => {
                let _ = sink
                    .send(GenerationSignal::Failed(ScoreError::UpstreamFailure(
                        format!("{e:#}"),
                    )))
                    .await;
                return;
            }
        };
        pump(fragments, sink).await;
    });
    consumer
}

/// Drive fragments through the decoder into the sink. Runs until the
/// upstream ends, the upstream errors, or the consumer goes away.
async fn pump(mut fragments: FragmentStream, sink: mpsc::Sender<GenerationSignal>) {
    let mut decoder = StreamDecoder::new();

    while let Some(next) = fragments.recv().await {
        match next {
            Ok(fragment) => {
                for event in decoder.feed(&fragment) {
                    if sink.send(GenerationSignal::Item(event)).await.is_err() {
                        // Consumer disconnected: stop decoding and drop the
                        // upstream subscription on return.
                        tracing::debug!("generation consumer went away, cancelling stream");
                        return;
                    }
                }
            }
            Err(e) => {
                decoder.fail();
                tracing::error!("generation stream error: {e:#}");
                let _ = sink
                    .send(GenerationSignal::Failed(ScoreError::UpstreamFailure(
                        format!("{e:#}"),
                    )))
                    .await;
                return;
            }
        }
    }

    match decoder.finish() {
        Ok(()) => {
            let _ = sink.send(GenerationSignal::Completed).await;
        }
        Err(e) => {
            let _ = sink.send(GenerationSignal::Failed(e)).await;
        }
    }
}
