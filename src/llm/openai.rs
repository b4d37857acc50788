//! OpenAI 对话补全客户端

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatModel, ChatPrompt, TextStream};
use crate::config::OpenAiConfig;
use crate::error::{AppError, Result};
use crate::sse::SseDecoder;

/// OpenAI 兼容的对话补全客户端
pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("No model API key configured; generation endpoints will serve fallback data");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn request_body(&self, prompt: &ChatPrompt, stream: bool) -> Value {
        let user_content = match &prompt.image_base64 {
            Some(image) => json!([
                { "type": "text", "text": prompt.user },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/png;base64,{}", image) }
                }
            ]),
            None => json!(prompt.user),
        };

        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": user_content }
            ]
        });

        if prompt.json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if stream {
            body["stream"] = json!(true);
        }
        if let Some(temperature) = prompt.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = prompt.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(presence) = prompt.presence_penalty {
            body["presence_penalty"] = json!(presence);
        }
        if let Some(frequency) = prompt.frequency_penalty {
            body["frequency_penalty"] = json!(frequency);
        }
        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "chat completion failed with {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete_json(&self, prompt: &ChatPrompt) -> Result<Value> {
        let body = self.request_body(prompt, false);
        let response: CompletionResponse = self.send(&body).await?.json().await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Upstream("empty completion content".to_string()))?;

        debug!(length = content.len(), "Received completion content");
        Ok(serde_json::from_str(&content)?)
    }

    async fn stream_text(&self, prompt: &ChatPrompt) -> Result<TextStream> {
        let body = self.request_body(prompt, true);
        let response = self.send(&body).await?;

        let state = ChunkState {
            bytes: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let stream = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(fragment) = state.pending.pop_front() {
                    return Some((Ok(fragment), state));
                }
                if state.finished {
                    return None;
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        let frames = state.decoder.push(&chunk);
                        for frame in frames {
                            state.absorb(&frame.data);
                        }
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(AppError::Upstream(e.to_string())), state));
                    }
                    None => {
                        if let Some(frame) = state.decoder.finish() {
                            state.absorb(&frame.data);
                        }
                        state.finished = true;
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}

/// 流式解码状态，`S` 为上游字节流
struct ChunkState<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S> ChunkState<S> {
    /// 处理一个上游数据帧；遇到 `[DONE]` 或 finish_reason 后忽略后续内容
    fn absorb(&mut self, data: &str) {
        if self.finished {
            return;
        }
        let data = data.trim();
        if data.is_empty() {
            return;
        }
        if data == "[DONE]" {
            self.finished = true;
            return;
        }

        match serde_json::from_str::<ChunkResponse>(data) {
            Ok(chunk) => {
                for choice in chunk.choices.into_iter().take(1) {
                    if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                        self.pending.push_back(content);
                    }
                    if choice.finish_reason.is_some() {
                        self.finished = true;
                    }
                }
            }
            Err(e) => warn!("Skipping malformed stream chunk: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> OpenAiChatModel {
        OpenAiChatModel::new(&OpenAiConfig {
            api_key: "sk-test".into(),
            ..OpenAiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_with_image_and_json_mode() {
        let prompt = ChatPrompt::new("system", "user")
            .with_image("AAAA")
            .json()
            .with_temperature(0.2);
        let body = model().request_body(&prompt, false);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["content"], "system");
        assert_eq!(body["messages"][1]["content"][0]["text"], "user");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("stream").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_body_text_only_stream() {
        let body = model().request_body(&ChatPrompt::new("s", "u"), true);
        assert_eq!(body["messages"][1]["content"], "u");
        assert_eq!(body["stream"], true);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_absorb_stops_at_finish_reason() {
        let mut state = ChunkState {
            bytes: stream::empty::<reqwest::Result<Vec<u8>>>(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        state.absorb(r#"{"choices":[{"delta":{"content":"Hi"},"finish_reason":null}]}"#);
        state.absorb(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        state.absorb(r#"{"choices":[{"delta":{"content":"late"}}]}"#);

        assert!(state.finished);
        assert_eq!(state.pending, VecDeque::from(vec!["Hi".to_string()]));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let model = OpenAiChatModel::new(&OpenAiConfig::default()).unwrap();
        let result = model.complete_json(&ChatPrompt::new("s", "u")).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
