use serde::Serialize;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};
use crate::config::Config;
use crate::error::{Result, AppError};

pub const COMPLETION_MODEL: &str = "text-davinci-003";

/// Streamed completion request. Only the prompt varies between requests.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompletionPayload {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    stream: bool,
    pub n: u32,
}

impl CompletionPayload {
    pub fn new(prompt: impl Into<String>) -> Self {
        CompletionPayload {
            model: COMPLETION_MODEL.into(),
            prompt: prompt.into(),
            temperature: 0.5,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 2048,
            stream: true,
            n: 1,
        }
    }

    pub fn stream(&self) -> bool {
        self.stream
    }
}

/// Starts a streamed completion and hands back the live response once the
/// provider has accepted the request.
pub async fn open_completion_stream(
    client: &Client,
    config: &Config,
    payload: &CompletionPayload,
) -> Result<Response> {
    info!(model = %payload.model, prompt_len = payload.prompt.len(), "requesting completion stream");

    let res = client
        .post(config.completions_url())
        .bearer_auth(&config.openai_api_key)
        .json(payload)
        .send()
        .await
        .map_err(|e| AppError::LlmError(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(AppError::LlmError(format!("provider returned {}: {}", status, body)));
    }

    Ok(res)
}

/// Incremental decoder for the provider's server-sent event stream.
///
/// Bytes go in as they arrive; completed `data:` lines come out as the text
/// fragments to forward. Lines may be split across any number of chunks.
#[derive(Debug, Default)]
pub struct CompletionEvents {
    buf: Vec<u8>,
    forwarded: usize,
    done: bool,
}

impl CompletionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `data: [DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut fragments = Vec::new();
        if self.done {
            return Ok(fragments);
        }
        self.buf.extend_from_slice(bytes);

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            let Some(data) = line.strip_prefix("data:") else {
                // event names, comments and blank separators
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                debug!(forwarded = self.forwarded, "completion stream finished");
                self.done = true;
                self.buf.clear();
                break;
            }
            if data.is_empty() {
                continue;
            }

            let event: serde_json::Value = serde_json::from_str(data)
                .map_err(|e| AppError::LlmError(format!("malformed completion event: {}", e)))?;
            let Some(text) = event["choices"][0]["text"].as_str() else {
                warn!(event = %data, "completion event without text");
                continue;
            };

            // The completion opens with blank lines; drop them.
            if self.forwarded < 2 && text.contains('\n') {
                continue;
            }
            self.forwarded += 1;
            fragments.push(text.to_string());
        }

        Ok(fragments)
    }
}
