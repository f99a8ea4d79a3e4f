//! Two-stage pipeline
//!
//! Validation -> structured analysis -> humanization, strictly in that order.
//! Only a rejected request is an `Err`; stage failures are reported inside
//! the outcome.

use super::{
    AnalysisError, AnalysisMetadata, AnalyzerSettings, ErrorKind, Humanizer, HumanizerSettings,
    RepairAnalyzer,
};
use crate::completion::build_service;
use crate::config::Config;
use crate::error::Result;
use crate::request::{RepairRequest, RequestDefaults};
use repair_advisor_common::StructuredAnalysis;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const TOTAL_STEPS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analysis,
    Humanization,
}

/// Result handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Stage that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

impl PipelineOutcome {
    fn completed(data: StructuredAnalysis, human_text: String, metadata: AnalysisMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            human_text: Some(human_text),
            metadata: Some(metadata),
            error: None,
            error_kind: None,
            stage: None,
        }
    }

    fn failed(stage: Stage, err: AnalysisError) -> Self {
        Self {
            success: false,
            data: None,
            human_text: None,
            metadata: None,
            error: Some(err.message),
            error_kind: Some(err.kind),
            stage: Some(stage),
        }
    }

    /// The stage error, if this outcome is a failure
    pub fn failure(&self) -> Option<AnalysisError> {
        match (self.success, self.error_kind) {
            (false, Some(kind)) => Some(AnalysisError {
                kind,
                message: self.error.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

pub struct Pipeline {
    analyzer: RepairAnalyzer,
    humanizer: Humanizer,
    defaults: RequestDefaults,
}

impl Pipeline {
    pub fn new(analyzer: RepairAnalyzer, humanizer: Humanizer) -> Self {
        Self {
            analyzer,
            humanizer,
            defaults: RequestDefaults::default(),
        }
    }

    /// Wire both stages to the configured provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = build_service(config)?;
        let analyzer = RepairAnalyzer::new(service.clone(), AnalyzerSettings::from_config(config));
        let humanizer = Humanizer::new(service, HumanizerSettings::from_config(config));
        Ok(Self::new(analyzer, humanizer).with_defaults(config.request_defaults()))
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub async fn run(&self, request: RepairRequest) -> Result<PipelineOutcome> {
        self.run_with_progress(request, |_, _, _| {}).await
    }

    /// # Arguments
    /// * `request` - caller input; rejected before any outbound call when incomplete
    /// * `on_progress` - progress callback (current, total, message)
    pub async fn run_with_progress(
        &self,
        request: RepairRequest,
        on_progress: impl Fn(usize, usize, &str),
    ) -> Result<PipelineOutcome> {
        let image = request.validate().inspect_err(|e| {
            warn!(error = %e, "request rejected");
        })?;
        let profile = request.profile(&self.defaults);

        on_progress(1, TOTAL_STEPS, "Step1: analyzing photo...");
        let analysis = match self
            .analyzer
            .analyze(image, &request.description, &profile)
            .await
        {
            Ok(analysis) => analysis,
            Err(err) => return Ok(PipelineOutcome::failed(Stage::Analysis, err)),
        };

        on_progress(2, TOTAL_STEPS, "Step2: writing repair plan...");
        match self
            .humanizer
            .humanize(&analysis.data, &request.description)
            .await
        {
            Ok(text) => {
                info!(
                    difficulty = ?analysis.data.difficulty(),
                    narrative_chars = text.len(),
                    "pipeline completed"
                );
                Ok(PipelineOutcome::completed(analysis.data, text, analysis.metadata))
            }
            Err(err) => {
                // the repair plan is still useful without the narrative
                let mut outcome = PipelineOutcome::failed(Stage::Humanization, err);
                outcome.data = Some(analysis.data);
                outcome.metadata = Some(analysis.metadata);
                Ok(outcome)
            }
        }
    }
}
