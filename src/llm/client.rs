use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::llm::sse::SseDecoder;

/// Trait for text generation against an external LLM, enabling mock testing.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the full generated text.
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<serde_json::Value>,
}

/// Append the text carried by one streamed chunk to `buffer`.
///
/// Delta content is either a plain string or a list of typed parts, of which
/// only `text` parts are kept.
fn append_chunk_text(buffer: &mut String, chunk: &StreamChunk) {
    for choice in &chunk.choices {
        match &choice.delta.content {
            Some(serde_json::Value::String(text)) => buffer.push_str(text),
            Some(serde_json::Value::Array(parts)) => {
                for part in parts {
                    if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                        buffer.push_str(text);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Accumulate the text of every `data:` event until `[DONE]`.
fn accumulate_events(buffer: &mut String, events: Vec<String>) -> Result<bool, AppError> {
    for event in events {
        if event.trim() == "[DONE]" {
            return Ok(true);
        }
        let chunk: StreamChunk = serde_json::from_str(&event)
            .map_err(|e| AppError::Consensus(format!("Malformed stream chunk: {e}")))?;
        append_chunk_text(buffer, &chunk);
    }
    Ok(false)
}

/// Mistral agents API client using streamed completions.
pub struct MistralAgentClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    agent_id: String,
}

impl MistralAgentClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let api_url: String = api_url.into();
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
        })
    }
}

#[async_trait]
impl LlmClient for MistralAgentClient {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        use futures::StreamExt;

        let body = serde_json::json!({
            "agent_id": self.agent_id,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": true,
        });

        let response = self
            .http
            .post(format!("{}/v1/agents/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Consensus(format!("LLM request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Consensus(format!("LLM request rejected: {e}")))?;

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::Consensus(format!("LLM stream failed: {e}")))?;
            if accumulate_events(&mut buffer, decoder.feed(&chunk))? {
                return Ok(buffer);
            }
        }

        if let Some(tail) = decoder.finish() {
            accumulate_events(&mut buffer, vec![tail])?;
        }

        tracing::debug!(chars = buffer.len(), "LLM stream ended without [DONE]");
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_string_deltas() {
        let mut buffer = String::new();
        let events = vec![
            r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":""}}]}"#.to_string(),
            r#"{"choices":[{"index":0,"delta":{"content":"```json\n{\"a\":"}}]}"#.to_string(),
            r#"{"choices":[{"index":0,"delta":{"content":" 1}\n```"}}]}"#.to_string(),
        ];
        let done = accumulate_events(&mut buffer, events).unwrap();
        assert!(!done);
        assert_eq!(buffer, "```json\n{\"a\": 1}\n```");
    }

    #[test]
    fn test_accumulates_typed_parts() {
        let mut buffer = String::new();
        let events = vec![
            r#"{"choices":[{"delta":{"content":[{"type":"text","text":"Hello"},{"type":"reference","reference_ids":[1]}]}}]}"#
                .to_string(),
        ];
        accumulate_events(&mut buffer, events).unwrap();
        assert_eq!(buffer, "Hello");
    }

    #[test]
    fn test_stops_at_done() {
        let mut buffer = String::new();
        let events = vec![
            r#"{"choices":[{"delta":{"content":"a"}}]}"#.to_string(),
            "[DONE]".to_string(),
            r#"{"choices":[{"delta":{"content":"ignored"}}]}"#.to_string(),
        ];
        assert!(accumulate_events(&mut buffer, events).unwrap());
        assert_eq!(buffer, "a");
    }

    #[test]
    fn test_malformed_chunk_is_an_error() {
        let mut buffer = String::new();
        let result = accumulate_events(&mut buffer, vec!["not json".to_string()]);
        assert!(matches!(result, Err(AppError::Consensus(_))));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = MistralAgentClient::new("https://api.mistral.ai/", "key", "agent").unwrap();
        assert_eq!(client.api_url, "https://api.mistral.ai");
    }
}
