//! Structured analyzer: one vision call, reply decoded as a JSON repair plan

use super::{Analysis, AnalysisError, AnalysisMetadata};
use crate::completion::{CompletionRequest, CompletionService};
use crate::config::Config;
use crate::request::{ImageInput, RepairProfile};
use repair_advisor_common::{build_analysis_prompt, parse_analysis_response};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            max_tokens: 2000,
            temperature: 0.3,
        }
    }
}

impl AnalyzerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.analysis_model().to_string(),
            ..Default::default()
        }
    }
}

pub struct RepairAnalyzer {
    service: Arc<dyn CompletionService>,
    settings: AnalyzerSettings,
}

impl RepairAnalyzer {
    pub fn new(service: Arc<dyn CompletionService>, settings: AnalyzerSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Run the structured stage
    ///
    /// Inputs are expected to be validated already (non-empty image and description).
    /// Both failure kinds come back as `AnalysisError`; nothing is retried.
    pub async fn analyze(
        &self,
        image: &ImageInput,
        description: &str,
        profile: &RepairProfile,
    ) -> Result<Analysis, AnalysisError> {
        let prompt = build_analysis_prompt(
            description,
            &profile.skill_level,
            &profile.budget,
            &profile.location,
        );

        // image first, then the instruction
        let request = CompletionRequest::new(&self.settings.model)
            .with_image(&image.media_type, image.to_base64())
            .with_text(prompt)
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature);

        info!(
            model = %self.settings.model,
            media_type = %image.media_type,
            image_bytes = image.bytes.len(),
            "structured analysis started"
        );

        let completion = self.service.complete(request).await.map_err(|e| {
            warn!(error = %e, "structured analysis call failed");
            AnalysisError::from(e)
        })?;

        debug!(chars = completion.text.len(), usage = ?completion.usage, "structured reply received");

        let data = parse_analysis_response(&completion.text).map_err(|e| {
            warn!(error = %e, "structured reply is not a JSON object");
            AnalysisError::parse(e.to_string())
        })?;

        Ok(Analysis {
            data,
            metadata: AnalysisMetadata {
                model_used: self.settings.model.clone(),
                tokens_used: completion.usage,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ErrorKind;
    use crate::completion::{MessagePart, Reply, ScriptedCompletion, Usage};
    use crate::request::{RepairRequest, RequestDefaults};
    use serde_json::json;

    const PLAN: &str = r#"{"diagnosis": "Hairline crack in drywall", "difficulty": "Beginner", "tools": ["Putty knife"]}"#;

    fn image() -> ImageInput {
        ImageInput::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
    }

    fn profile() -> RepairProfile {
        RepairRequest::new("crack").profile(&RequestDefaults::default())
    }

    fn analyzer(service: Arc<ScriptedCompletion>) -> RepairAnalyzer {
        RepairAnalyzer::new(service, AnalyzerSettings::default())
    }

    #[tokio::test]
    async fn test_analyze_returns_document_unchanged() {
        let usage = Usage {
            prompt_tokens: 800,
            completion_tokens: 200,
            total_tokens: 1000,
        };
        let service = Arc::new(ScriptedCompletion::texts([PLAN]).with_usage(usage));
        let analysis = analyzer(service.clone())
            .analyze(&image(), "crack in drywall", &profile())
            .await
            .unwrap();

        let expected = json!({"diagnosis": "Hairline crack in drywall", "difficulty": "Beginner", "tools": ["Putty knife"]});
        assert_eq!(serde_json::to_value(&analysis.data).unwrap(), expected);
        assert_eq!(analysis.metadata.model_used, "gpt-4o");
        assert_eq!(analysis.metadata.tokens_used, Some(usage));
    }

    #[tokio::test]
    async fn test_analyze_request_shape() {
        let service = Arc::new(ScriptedCompletion::texts([PLAN]));
        analyzer(service.clone())
            .analyze(&image(), "water stain on ceiling", &profile())
            .await
            .unwrap();

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(sent.model, "gpt-4o");
        assert_eq!(sent.max_tokens, 2000);
        assert!((sent.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(
            sent.parts[0],
            MessagePart::Image {
                media_type: "image/jpeg".into(),
                data: "/9j/4A==".into(),
            }
        );
        match &sent.parts[1] {
            MessagePart::Text(prompt) => {
                assert!(prompt.contains("water stain on ceiling"));
                assert!(prompt.contains("United States"));
            }
            other => panic!("Expected text part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_parse_error() {
        let service = Arc::new(ScriptedCompletion::texts(["{not json"]));
        let err = analyzer(service)
            .analyze(&image(), "crack", &profile())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_analyze_transport_error() {
        let service = Arc::new(ScriptedCompletion::new([Reply::Status(500, "upstream down".into())]));
        let err = analyzer(service)
            .analyze(&image(), "crack", &profile())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TransportError);
        assert!(err.message.contains("upstream down"));
    }
}
