//! Narrative humanizer: restates a repair plan as plain prose

use super::AnalysisError;
use crate::completion::{CompletionRequest, CompletionService};
use crate::config::Config;
use repair_advisor_common::{build_narrative_prompt, StructuredAnalysis, NARRATIVE_SYSTEM_PROMPT};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct HumanizerSettings {
    pub model: String,
    /// Room for a 600-word answer
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for HumanizerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            max_tokens: 900,
            temperature: 0.5,
            system_prompt: NARRATIVE_SYSTEM_PROMPT.into(),
        }
    }
}

impl HumanizerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.narrative_model().to_string(),
            ..Default::default()
        }
    }
}

pub struct Humanizer {
    service: Arc<dyn CompletionService>,
    settings: HumanizerSettings,
}

impl Humanizer {
    pub fn new(service: Arc<dyn CompletionService>, settings: HumanizerSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &HumanizerSettings {
        &self.settings
    }

    /// Text-only call; the reply is returned exactly as received.
    /// The style rules in the prompt are not checked.
    pub async fn humanize(
        &self,
        analysis: &StructuredAnalysis,
        original_description: &str,
    ) -> Result<String, AnalysisError> {
        let prompt = build_narrative_prompt(&analysis.to_pretty_json(), original_description);

        let request = CompletionRequest::new(&self.settings.model)
            .with_system(&self.settings.system_prompt)
            .with_text(prompt)
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature);

        info!(model = %self.settings.model, "humanization started");

        let completion = self.service.complete(request).await.map_err(|e| {
            warn!(error = %e, "humanization call failed");
            AnalysisError::from(e)
        })?;

        debug!(chars = completion.text.len(), usage = ?completion.usage, "narrative received");
        Ok(completion.text)
    }
}
