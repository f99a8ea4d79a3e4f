//! Completion service
//!
//! The hosted model is an opaque capability: prompt parts (text and inline
//! images) in, generated text out. Two HTTP clients implement it (OpenAI chat
//! completions and Gemini generateContent); tests substitute `ScriptedCompletion`.

mod gemini;
mod openai;
mod scripted;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use scripted::{Reply, ScriptedCompletion};

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    /// Inline image, base64 payload tagged with its media type
    Image { media_type: String, data: String },
}

/// One outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub parts: Vec<MessagePart>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            parts: Vec::new(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(MessagePart::Text(text.into()));
        self
    }

    pub fn with_image(mut self, media_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.parts.push(MessagePart::Image {
            media_type: media_type.into(),
            data: data.into(),
        });
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, MessagePart::Image { .. }))
    }

    /// All text parts joined with blank lines
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text(t) => Some(t.as_str()),
                MessagePart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from completion service")]
    EmptyResponse,

    #[error("Unexpected response payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CompletionError {
    // request URLs can carry credentials
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Http(err.without_url())
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, CompletionError>;
}

/// Build the client for the configured provider
pub fn build_service(config: &Config) -> Result<Arc<dyn CompletionService>> {
    let api_key = config.get_api_key()?;
    let timeout = Duration::from_secs(config.timeout_seconds);
    let base_url = config.base_url().to_string();

    let service: Arc<dyn CompletionService> = match config.ai_provider {
        AiProvider::OpenAi => Arc::new(OpenAiClient::new(api_key, base_url, timeout)?),
        AiProvider::Gemini => Arc::new(GeminiClient::new(api_key, base_url, timeout)?),
    };

    tracing::debug!(provider = config.ai_provider.name(), "completion service ready");
    Ok(service)
}
