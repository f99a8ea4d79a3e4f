//! Repair Advisor
//!
//! Photo + description in, structured repair plan and a plain-language
//! walkthrough out.

pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod request;

pub use analyzer::{Pipeline, PipelineOutcome};
pub use error::{AdvisorError, Result};
pub use request::{ImageInput, RepairRequest};
