//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::domain::llm::{FragmentStream, GenerationClient, Message, Prompt};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";

/// Sampling parameters sent with every request
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_GENERATION_MODEL.to_string(),
            temperature: Some(0.2),
            max_tokens: Some(1024),
        }
    }
}

#[derive(Debug)]
pub struct OpenAiGenerationClient<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    params: GenerationParams,
}

impl<C: HttpClientTrait> OpenAiGenerationClient<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, prompt: &Prompt, stream: bool) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> =
            prompt.messages.iter().map(OpenAiMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": self.params.model,
            "messages": messages,
            "stream": stream,
        });

        if let Some(temp) = self.params.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = self.params.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl<C: HttpClientTrait> GenerationClient for OpenAiGenerationClient<C> {
    async fn generate(&self, prompt: &Prompt) -> Result<String, DomainError> {
        let body = self.build_request(prompt, false);
        let response = self
            .client
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    async fn generate_stream(&self, prompt: &Prompt) -> Result<FragmentStream, DomainError> {
        let body = self.build_request(prompt, true);
        let byte_stream = self
            .client
            .post_json_stream(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        // Network chunks split SSE lines arbitrarily; the decoder carries the
        // partial line over and the stream ends at [DONE]. The trailing `None`
        // marks end of body so a missing [DONE] surfaces as an error.
        let fragments = byte_stream
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(SseDecoder::default(), |decoder, chunk| {
                if decoder.finished {
                    return future::ready(None);
                }
                let items = match chunk {
                    Some(Ok(bytes)) => decoder.feed(&bytes),
                    Some(Err(e)) => {
                        decoder.finished = true;
                        vec![Err(e)]
                    }
                    None => decoder.finish(),
                };
                future::ready(Some(stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(fragments))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Incremental decoder for `data:` lines of a chat completions stream
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, DomainError>> {
        self.buffer.extend_from_slice(bytes);
        let mut items = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);

            match parse_data_line(line.trim_end_matches(['\r', '\n'])) {
                Some(Frame::Content(content)) => items.push(Ok(content)),
                Some(Frame::Done) => {
                    self.finished = true;
                    break;
                }
                Some(Frame::Failed(e)) => {
                    self.finished = true;
                    items.push(Err(e));
                    break;
                }
                None => {}
            }
        }

        items
    }

    /// Flush at end of body; an unterminated stream is a failure
    fn finish(&mut self) -> Vec<Result<String, DomainError>> {
        if self.finished {
            return Vec::new();
        }

        let mut items = if self.buffer.is_empty() {
            Vec::new()
        } else {
            self.feed(b"\n")
        };

        if !self.finished {
            self.finished = true;
            items.push(Err(DomainError::provider(
                "openai",
                "stream ended before [DONE]",
            )));
        }

        items
    }
}

#[derive(Debug)]
enum Frame {
    Content(String),
    Done,
    Failed(DomainError),
}

fn parse_data_line(line: &str) -> Option<Frame> {
    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(Frame::Done);
    }

    let chunk: OpenAiStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Frame::Failed(DomainError::provider(
                "openai",
                format!("Malformed stream chunk: {}", e),
            )))
        }
    };

    if let Some(error) = chunk.error {
        return Some(Frame::Failed(DomainError::provider("openai", error.message)));
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(Frame::Content)
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl OpenAiMessage {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    error: Option<OpenAiStreamError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamError {
    message: String,
}
