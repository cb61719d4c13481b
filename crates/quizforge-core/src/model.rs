//! Domain model shared across the scoring and generation pipeline.
//!
//! All values here arrive pre-validated from the surrounding application
//! layer (persistence, request handling); the core never mutates reference
//! data and produces each `ScoredAnswer` exactly once per scoring call.

use serde::{Deserialize, Serialize};

/// What kind of quiz an application hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    /// Answers carry fixed option weights; the total maps to a result tier.
    Graded,
    /// Answers are judged by a language model (personality tests and the like).
    Assessment,
}

impl AppType {
    /// Human-readable category label used in generation prompts.
    pub fn label(&self) -> &'static str {
        match self {
            AppType::Graded => "graded quiz",
            AppType::Assessment => "assessment",
        }
    }
}

/// How submitted answers are turned into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Sum option weights, resolve against the tier table.
    CustomScore,
    /// Ask an external model for the verdict, with response caching.
    ModelAssisted,
}

/// Application metadata, as supplied by the surrounding layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub app_type: AppType,
}

/// One selectable option of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Choice key the user submits (e.g. "A").
    pub key: String,
    /// Display text.
    pub value: String,
    /// Weight contributed when this option is chosen. Unscored options stay 0.
    #[serde(default)]
    pub score: i32,
}

/// A single question with its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionContent {
    pub title: String,
    pub options: Vec<QuestionOption>,
}

/// Everything a strategy needs to score one submission.
///
/// Immutable for the duration of the call. The caller's choice list is
/// positionally aligned with `questions` and is length-checked before any
/// scoring logic runs.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub app: AppInfo,
    pub strategy: StrategyKind,
    pub questions: Vec<QuestionContent>,
}

/// A scoring-range bucket with its human-readable verdict.
///
/// Read-only reference data. Resolution only works if the tier set includes
/// a ceiling tier whose threshold is at least the maximum attainable score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTier {
    #[serde(default)]
    pub id: Option<u64>,
    pub app_id: u64,
    pub score_threshold: i32,
    pub result_name: String,
    pub result_desc: String,
    #[serde(default)]
    pub result_picture: Option<String>,
}

/// The outcome of one successful scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub app_id: u64,
    pub app_type: AppType,
    pub strategy: StrategyKind,
    /// The submitted choices, serialized as a JSON array.
    pub choices: String,
    #[serde(default)]
    pub result_id: Option<u64>,
    pub result_name: String,
    pub result_desc: String,
    #[serde(default)]
    pub result_picture: Option<String>,
    /// The computed total for weight-summed strategies; absent for
    /// model-judged verdicts.
    #[serde(default)]
    pub result_score: Option<i32>,
}

/// One complete generated item, reassembled from the model stream.
///
/// `text` is a single balanced `{...}` span exactly as it arrived (minus
/// stripped whitespace). Consumed once by the sink; the decoder keeps no
/// history after emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationEvent {
    /// Emission sequence number, starting at 0, matching arrival order.
    pub seq: u64,
    pub text: String,
}

impl GenerationEvent {
    /// JSON-string-escaped single-line form, suitable for server push
    /// transports that cannot carry embedded newlines.
    pub fn sse_payload(&self) -> String {
        serde_json::to_string(&self.text).expect("string serialization is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_type_labels() {
        assert_eq!(AppType::Graded.label(), "graded quiz");
        assert_eq!(AppType::Assessment.label(), "assessment");
    }

    #[test]
    fn sse_payload_escapes_to_single_line() {
        let event = GenerationEvent {
            seq: 0,
            text: "{\"title\":\"line\\nbreak\"}".to_string(),
        };
        let payload = event.sse_payload();
        assert!(!payload.contains('\n'));
        let round_trip: String = serde_json::from_str(&payload).unwrap();
        assert_eq!(round_trip, event.text);
    }

    #[test]
    fn question_option_score_defaults_to_zero() {
        let option: QuestionOption =
            serde_json::from_str(r#"{"key": "A", "value": "Working alone"}"#).unwrap();
        assert_eq!(option.score, 0);
    }
}
