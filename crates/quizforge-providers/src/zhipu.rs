//! ZhiPu GLM API provider implementation.
//!
//! The open platform speaks an OpenAI-shaped chat completion protocol at
//! `/api/paas/v4/chat/completions`, in both one-shot and SSE streaming form.

use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::instrument;

use quizforge_core::error::ProviderError;
use quizforge_core::traits::{ChatProvider, ChatRequest, ChatResponse, FragmentStream};

use crate::sse::SseLineBuffer;

const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// ZhiPu GLM provider.
pub struct ZhipuProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ZhipuProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    fn body(&self, request: &ChatRequest, stream: bool) -> ZhipuRequest {
        ZhipuRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
            messages: vec![
                ZhipuMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ZhipuMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
        }
    }

    async fn post(&self, body: &ZhipuRequest) -> anyhow::Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/v4/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct ZhipuRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
    messages: Vec<ZhipuMessage>,
}

#[derive(Serialize)]
struct ZhipuMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ZhipuResponse {
    choices: Vec<ZhipuChoice>,
    model: String,
}

#[derive(Deserialize)]
struct ZhipuChoice {
    message: ZhipuChoiceMessage,
}

#[derive(Deserialize)]
struct ZhipuChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ZhipuStreamChunk {
    #[serde(default)]
    choices: Vec<ZhipuStreamChoice>,
}

#[derive(Deserialize)]
struct ZhipuStreamChoice {
    #[serde(default)]
    delta: ZhipuDelta,
}

#[derive(Deserialize, Default)]
struct ZhipuDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatProvider for ZhipuProvider {
    fn name(&self) -> &str {
        "zhipu"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let response = self.post(&self.body(request, false)).await?;

        let api_response: ZhipuResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            model: api_response.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn chat_stream(&self, request: &ChatRequest) -> anyhow::Result<FragmentStream> {
        let response = self.post(&self.body(request, true)).await?;

        let (tx, rx) = mpsc::channel(32);
        let mut bytes = response.bytes_stream();
        tokio::spawn(async move {
            let mut lines = SseLineBuffer::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::NetworkError(e.to_string()).into()))
                            .await;
                        return;
                    }
                };
                for payload in lines.push(&chunk) {
                    if payload == "[DONE]" {
                        return;
                    }
                    let delta: ZhipuStreamChunk = match serde_json::from_str(&payload) {
                        Ok(delta) => delta,
                        Err(e) => {
                            tracing::warn!("skipping malformed stream chunk: {e}");
                            continue;
                        }
                    };
                    let content = delta
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default();
                    if !content.is_empty() && tx.send(Ok(content)).await.is_err() {
                        // Consumer dropped the stream; stop reading.
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "glm-4-flash".into(),
            system_prompt: "You are a rigorous quiz author.".into(),
            user_prompt: "MBTI Personality Test\nFind out your type\nassessment\n2\n2".into(),
            max_tokens: 1024,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn successful_chat() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "{\"resultName\": \"INTJ\", \"resultDesc\": \"...\"}", "role": "assistant"}, "index": 0}],
            "model": "glm-4-flash"
        });

        Mock::given(method("POST"))
            .and(path("/v4/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = ZhipuProvider::new("test-key", Some(server.uri()));
        let response = provider.chat(&request()).await.unwrap();
        assert!(response.content.contains("INTJ"));
        assert_eq!(response.model, "glm-4-flash");
    }

    #[tokio::test]
    async fn auth_failure_maps_to_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let provider = ZhipuProvider::new("bad-key", Some(server.uri()));
        let err = provider.chat(&request()).await.unwrap_err();
        let provider_err = err.downcast::<ProviderError>().unwrap();
        assert!(provider_err.is_permanent());
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = ZhipuProvider::new("key", Some(server.uri()));
        let err = provider.chat(&request()).await.unwrap_err();
        match err.downcast::<ProviderError>().unwrap() {
            ProviderError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, 7000),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let provider = ZhipuProvider::new("key", Some(server.uri()));
        let err = provider.chat(&request()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn streaming_forwards_delta_fragments() {
        let server = MockServer::start().await;

        let sse_body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"[{\\\"title\\\":\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\\\"Q1\\\"}]\"}}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/v4/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let provider = ZhipuProvider::new("key", Some(server.uri()));
        let mut fragments = provider.chat_stream(&request()).await.unwrap();

        let mut collected = String::new();
        while let Some(fragment) = fragments.recv().await {
            collected.push_str(&fragment.unwrap());
        }
        assert_eq!(collected, "[{\"title\":\"Q1\"}]");
    }
}
