//! Content generator: the external collaborator that proposes command
//! batches, plus parsing of its text responses.
//!
//! The driver only sees the `ContentGenerator` trait; tests drive the
//! loop with a scripted implementation. The production implementation
//! talks to an OpenAI-compatible chat-completions endpoint over
//! blocking HTTP, matching the strictly sequential execution model.

use crate::cli::GenerationMode;
use crate::command::Command;
use crate::prompt::{self, GenerationContext};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Instant;
use tracing::info;

pub const API_KEY_ENV: &str = "SPECSMITH_API_KEY";
pub const API_URL_ENV: &str = "SPECSMITH_API_URL";
pub const MODEL_ENV: &str = "SPECSMITH_MODEL";

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// External capability that, given project context, proposes the next
/// batch of commands as a text payload.
pub trait ContentGenerator {
    fn generate(&mut self, context: &GenerationContext<'_>) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Chat-completions client. In context-accumulating mode it keeps the
/// whole conversation (seed, per-cycle deltas, assistant replies) and
/// resends it each call; in single-shot mode every call stands alone.
pub struct ApiGenerator {
    api_key: String,
    api_url: String,
    model: String,
    mode: GenerationMode,
    transcript: Vec<ChatMessage>,
}

impl ApiGenerator {
    /// Construct from the environment. The API key check is the first
    /// thing the generate command does, before any file I/O.
    pub fn from_env(mode: GenerationMode) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .map_err(|_| anyhow!("missing required {API_KEY_ENV} environment variable"))?;
        let api_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            api_url,
            model,
            mode,
            transcript: Vec::new(),
        })
    }

    fn request(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        let start = Instant::now();
        let mut response = ureq::post(&self.api_url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .send_json(&body)
            .context("call content generation API")?;
        let envelope: ChatResponse = response
            .body_mut()
            .read_json()
            .context("decode content generation response")?;
        let text = envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("content generation response has no choices"))?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_bytes = text.len(),
            "generator invocation complete"
        );
        Ok(text)
    }
}

impl ContentGenerator for ApiGenerator {
    fn generate(&mut self, context: &GenerationContext<'_>) -> Result<String> {
        match self.mode {
            GenerationMode::SingleShot => {
                let messages = vec![
                    ChatMessage {
                        role: "system",
                        content: prompt::system_prompt().to_string(),
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt::full_prompt(context),
                    },
                ];
                self.request(&messages)
            }
            GenerationMode::ContextAccumulating => {
                if self.transcript.is_empty() {
                    self.transcript.push(ChatMessage {
                        role: "system",
                        content: prompt::system_prompt().to_string(),
                    });
                    self.transcript.push(ChatMessage {
                        role: "user",
                        content: prompt::seed_prompt(context.spec, context.references),
                    });
                }
                self.transcript.push(ChatMessage {
                    role: "user",
                    content: prompt::delta_prompt(context),
                });
                let text = self.request(&self.transcript)?;
                self.transcript.push(ChatMessage {
                    role: "assistant",
                    content: text.clone(),
                });
                Ok(text)
            }
        }
    }
}

/// Parse generator response text into a command batch.
///
/// Generators occasionally wrap the array in markdown fences or
/// surrounding prose; both are tolerated. Anything else is reported
/// upward and treated exactly like a transport failure.
pub fn parse_command_batch(text: &str) -> Result<Vec<Command>> {
    let json_text = extract_json(text);
    match serde_json::from_str::<Vec<Command>>(json_text) {
        Ok(batch) => Ok(batch),
        Err(err) => {
            if let Some(batch) = extract_array_from_text(text) {
                return Ok(batch);
            }
            Err(anyhow!(
                "parse command batch as JSON array: {err}\n\nFirst 500 chars of response: {}",
                truncate(text, 500)
            ))
        }
    }
}

/// Extract JSON from text that might have markdown code fences.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    text
}

/// Last resort: scan for an embedded array in prose-wrapped responses.
fn extract_array_from_text(raw: &str) -> Option<Vec<Command>> {
    for (idx, ch) in raw.char_indices() {
        if ch != '[' {
            continue;
        }
        let mut deserializer = serde_json::Deserializer::from_str(&raw[idx..]);
        if let Ok(batch) = Vec::<Command>::deserialize(&mut deserializer) {
            return Some(batch);
        }
    }
    None
}

fn truncate(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
