//! Gemini generateContent client

use super::{Completion, CompletionError, CompletionRequest, CompletionService, MessagePart, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        let body = GeminiRequest::from_request(&request);

        debug!(
            model = %request.model,
            parts = request.parts.len(),
            image = request.has_image(),
            "POST generateContent"
        );

        let response = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "generateContent rejected");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_gemini_response(&text)
    }
}

/// generateContent request body
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

impl GeminiRequest {
    fn from_request(request: &CompletionRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                MessagePart::Text(text) => Part::Text { text: text.clone() },
                MessagePart::Image { media_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: media_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();

        Self {
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            system_instruction: request.system.as_ref().map(|s| Content {
                role: None,
                parts: vec![Part::Text { text: s.clone() }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

/// generateContent response body
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

fn parse_gemini_response(body: &str) -> Result<Completion, CompletionError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Decode(e.to_string()))?;

    // long replies can arrive split across several text parts
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .ok_or(CompletionError::EmptyResponse)?;

    let usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    Ok(Completion { text, usage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gemini_request_serialize() {
        let request = CompletionRequest::new("gemini-2.0-flash")
            .with_image("image/png", "iVBORw0KGgo=")
            .with_text("analyze")
            .max_tokens(2000)
            .temperature(0.3);

        let value = serde_json::to_value(GeminiRequest::from_request(&request)).expect("serialize failed");
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0], json!({"inline_data": {"mime_type": "image/png", "data": "iVBORw0KGgo="}}));
        assert_eq!(parts[1], json!({"text": "analyze"}));
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2000);
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_gemini_system_instruction() {
        let request = CompletionRequest::new("gemini-2.0-flash-lite")
            .with_system("be friendly")
            .with_text("explain");

        let value = serde_json::to_value(GeminiRequest::from_request(&request)).expect("serialize failed");
        assert_eq!(value["systemInstruction"], json!({"parts": [{"text": "be friendly"}]}));
        assert_eq!(value["contents"][0]["role"], "user");
    }

    #[test]
    fn test_gemini_response_deserialize() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"diagnosis\":"}, {"text": " \"ok\"}"}]}
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }"#;

        let completion = parse_gemini_response(body).unwrap();
        assert_eq!(completion.text, "{\"diagnosis\": \"ok\"}");
        assert_eq!(
            completion.usage,
            Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 })
        );
    }

    #[test]
    fn test_gemini_response_blocked() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert!(matches!(parse_gemini_response(body), Err(CompletionError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        // nothing listens on the discard port
        let client = GeminiClient::new("SECRET-KEY-123", "http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let err = client
            .complete(CompletionRequest::new("gemini-2.0-flash").with_text("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "key leaked: {}", err);
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("k", "https://example.test/v1beta", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
