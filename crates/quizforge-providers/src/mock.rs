//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use quizforge_core::traits::{ChatProvider, ChatRequest, ChatResponse, FragmentStream};

/// A mock chat provider for exercising scoring and generation without real
/// API calls.
///
/// Synchronous replies are chosen by prompt-substring matching; the
/// streaming variant replays a scripted fragment list.
pub struct MockChatProvider {
    /// Map of prompt substring → reply.
    responses: HashMap<String, String>,
    /// Default reply if no prompt matches.
    default_response: String,
    /// Fragments replayed by `chat_stream`, in order.
    fragments: Vec<String>,
    /// Number of calls made (both variants).
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockChatProvider {
    /// Create a mock with the given prompt→reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "{\"resultName\": \"mock\", \"resultDesc\": \"mock verdict\"}"
                .to_string(),
            fragments: Vec::new(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: response.to_string(),
            fragments: Vec::new(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock whose stream replays the given fragments.
    pub fn with_fragments(fragments: Vec<String>) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: String::new(),
            fragments,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.user_prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(ChatResponse {
            content,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }

    async fn chat_stream(&self, request: &ChatRequest) -> anyhow::Result<FragmentStream> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let fragments = self.fragments.clone();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> ChatRequest {
        ChatRequest {
            model: "mock".into(),
            system_prompt: "system".into(),
            user_prompt: prompt.into(),
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockChatProvider::with_fixed_response("{\"resultName\": \"A\"}");
        let response = provider.chat(&request("anything")).await.unwrap();
        assert_eq!(response.content, "{\"resultName\": \"A\"}");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().user_prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert("MBTI".to_string(), "{\"resultName\": \"INTJ\"}".to_string());
        responses.insert(
            "arithmetic".to_string(),
            "{\"resultName\": \"pass\"}".to_string(),
        );
        let provider = MockChatProvider::new(responses);

        let resp = provider.chat(&request("the MBTI test")).await.unwrap();
        assert!(resp.content.contains("INTJ"));
        let resp = provider.chat(&request("an arithmetic quiz")).await.unwrap();
        assert!(resp.content.contains("pass"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_stream_replays_in_order() {
        let provider = MockChatProvider::with_fragments(vec![
            "[{\"title\":".to_string(),
            "\"Q1\"}]".to_string(),
        ]);
        let mut fragments = provider.chat_stream(&request("generate")).await.unwrap();

        let mut collected = String::new();
        while let Some(fragment) = fragments.recv().await {
            collected.push_str(&fragment.unwrap());
        }
        assert_eq!(collected, "[{\"title\":\"Q1\"}]");
    }
}
