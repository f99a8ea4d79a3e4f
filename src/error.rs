use crate::completion::CompletionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("API key is not set. Run `repair-advisor config --set-api-key YOUR_KEY` or set {0}")]
    MissingApiKey(&'static str),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Completion service error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Analysis failed ({kind}): {message}")]
    AnalysisFailed { kind: String, message: String },

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] repair_advisor_common::Error),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
