//! The chat provider trait, fixed prompts, and response extraction.
//!
//! The async trait is implemented by the `quizforge-providers` crate; the
//! core only ever sees a `dyn ChatProvider`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{AppInfo, ScoringContext};

// ---------------------------------------------------------------------------
// Chat provider trait
// ---------------------------------------------------------------------------

/// Ordered text fragments from a streaming model response, terminated by the
/// channel closing (completion) or an `Err` item (upstream failure).
pub type FragmentStream = mpsc::Receiver<anyhow::Result<String>>;

/// Trait for chat model backends.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name (e.g. "zhipu").
    fn name(&self) -> &str;

    /// One synchronous round trip: the full response text in one piece.
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse>;

    /// Streaming variant: fragments delivered in arrival order.
    async fn chat_stream(&self, request: &ChatRequest) -> anyhow::Result<FragmentStream>;
}

/// A single chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g. "glm-4-flash").
    pub model: String,
    /// Fixed system instruction.
    pub system_prompt: String,
    /// Caller-composed message.
    pub user_prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a synchronous chat call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Fixed system prompts
// ---------------------------------------------------------------------------

/// System instruction for model-judged scoring.
pub const SCORING_SYSTEM_PROMPT: &str = "\
You are a rigorous evaluation expert. I will give you the following information:
```
application name,
application description,
the questions and the user's answers as a list: [{\"title\": \"question\", \"answer\": \"user answer\"}]
```

Evaluate the user by following these steps:
1. Produce a clear verdict: a short result name and a detailed result description (more than 200 words)
2. Output the verdict strictly in the JSON format below:
```
{\"resultName\": \"result name\", \"resultDesc\": \"result description\"}
```
3. The response must be a JSON object";

/// System instruction for question generation.
pub const GENERATION_SYSTEM_PROMPT: &str = "\
You are a rigorous quiz author. I will give you the following information:
```
application name,
application description,
application category,
the number of questions to generate,
the number of options per question
```

Write the questions by following these steps:
1. Keep questions and options as short as possible, do not number the questions, use exactly the requested option count, and do not repeat questions
2. Output the questions strictly in the JSON format below:
```
[{\"options\":[{\"value\":\"option text\",\"key\":\"A\"},{\"value\":\"\",\"key\":\"B\"}],\"title\":\"question title\"}]
```
title is the question, options are its choices; option keys run alphabetically (A, B, C, D and so on) and value is the option text
3. Strip any numbering that slipped into a question title
4. The response must be a JSON array";

// ---------------------------------------------------------------------------
// User prompt builders
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct QuestionAnswerPair<'a> {
    title: &'a str,
    answer: &'a str,
}

/// Compose the judge message: application name, description, then the
/// question/answer pairs as a compact JSON array.
pub fn scoring_user_prompt(ctx: &ScoringContext, choices: &[String]) -> String {
    let pairs: Vec<QuestionAnswerPair<'_>> = ctx
        .questions
        .iter()
        .zip(choices)
        .map(|(question, answer)| QuestionAnswerPair {
            title: &question.title,
            answer,
        })
        .collect();
    let pairs_json =
        serde_json::to_string(&pairs).expect("question/answer pair serialization is infallible");
    format!("{}\n{}\n{}", ctx.app.name, ctx.app.description, pairs_json)
}

/// Compose the generation message: application name, description, category,
/// question count, option count, one per line.
pub fn generation_user_prompt(app: &AppInfo, question_count: u32, option_count: u32) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        app.name,
        app.description,
        app.app_type.label(),
        question_count,
        option_count
    )
}

// ---------------------------------------------------------------------------
// Response extraction
// ---------------------------------------------------------------------------

/// Extract the first top-level `{...}` object from raw model output,
/// scanning from the first `{` to the last `}`.
///
/// Models routinely wrap the requested JSON in prose or markdown fences;
/// this slices past both. Returns `None` when no balanced pair exists.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Extract the first top-level `[...]` array, same slicing rule.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppType, QuestionContent, QuestionOption, StrategyKind};

    fn sample_context() -> ScoringContext {
        ScoringContext {
            app: AppInfo {
                id: 7,
                name: "MBTI Personality Test".to_string(),
                description: "Find out your MBTI type".to_string(),
                app_type: AppType::Assessment,
            },
            strategy: StrategyKind::ModelAssisted,
            questions: vec![
                QuestionContent {
                    title: "You usually prefer".to_string(),
                    options: vec![QuestionOption {
                        key: "A".to_string(),
                        value: "Working alone".to_string(),
                        score: 0,
                    }],
                },
                QuestionContent {
                    title: "When planning an activity".to_string(),
                    options: vec![],
                },
            ],
        }
    }

    #[test]
    fn scoring_prompt_pairs_questions_with_answers() {
        let ctx = sample_context();
        let prompt = scoring_user_prompt(
            &ctx,
            &["Working alone".to_string(), "Improvise".to_string()],
        );
        let mut lines = prompt.lines();
        assert_eq!(lines.next(), Some("MBTI Personality Test"));
        assert_eq!(lines.next(), Some("Find out your MBTI type"));
        let pairs = lines.next().unwrap();
        assert!(pairs.contains(r#"{"title":"You usually prefer","answer":"Working alone"}"#));
        assert!(pairs.contains(r#"{"title":"When planning an activity","answer":"Improvise"}"#));
    }

    #[test]
    fn generation_prompt_layout() {
        let ctx = sample_context();
        let prompt = generation_user_prompt(&ctx.app, 10, 3);
        assert_eq!(
            prompt,
            "MBTI Personality Test\nFind out your MBTI type\nassessment\n10\n3"
        );
    }

    #[test]
    fn extract_object_from_surrounding_prose() {
        let raw = "Sure, here is the verdict:\n{\"resultName\": \"INTJ\", \"resultDesc\": \"...\"}\nHope that helps!";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"resultName\": \"INTJ\", \"resultDesc\": \"...\"}")
        );
    }

    #[test]
    fn extract_object_spans_nested_braces() {
        let raw = "x {\"a\": {\"b\": 1}} y";
        assert_eq!(extract_json_object(raw), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn extract_object_rejects_missing_braces() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} reversed {"), None);
    }

    #[test]
    fn extract_array_from_markdown_fence() {
        let raw = "```json\n[{\"title\": \"Q1\"}]\n```";
        assert_eq!(extract_json_array(raw), Some("[{\"title\": \"Q1\"}]"));
    }
}
