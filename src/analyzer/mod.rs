//! Repair analysis
//!
//! Two stages run in order for one request:
//! - structured: photo + description -> JSON repair plan
//! - humanizer: repair plan -> conversational narrative
//!
//! Both stages report failures as `AnalysisError` values tagged with an
//! `ErrorKind`; `Pipeline` folds them into a single `PipelineOutcome`.

mod humanizer;
mod pipeline;
mod structured;

pub use humanizer::{Humanizer, HumanizerSettings};
pub use pipeline::{Pipeline, PipelineOutcome, Stage};
pub use structured::{AnalyzerSettings, RepairAnalyzer};

use crate::completion::{CompletionError, Usage};
use repair_advisor_common::StructuredAnalysis;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Reply was not a JSON object after fence stripping
    ParseError,
    /// The completion call itself failed
    TransportError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse_error",
            ErrorKind::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ParseError,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TransportError,
            message: message.into(),
        }
    }
}

impl From<CompletionError> for AnalysisError {
    fn from(err: CompletionError) -> Self {
        AnalysisError::transport(err.to_string())
    }
}

impl From<AnalysisError> for crate::error::AdvisorError {
    fn from(err: AnalysisError) -> Self {
        crate::error::AdvisorError::AnalysisFailed {
            kind: err.kind.to_string(),
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub model_used: String,
    pub tokens_used: Option<Usage>,
}

/// Successful first-stage result
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The model's document, unchanged
    pub data: StructuredAnalysis,
    pub metadata: AnalysisMetadata,
}
