//! Repair Advisor Common Library
//!
//! Runtime-free pieces shared by every front end: the analysis document,
//! prompt templates and the tolerant response parser.

pub mod error;
pub mod parser;
pub mod prompts;
pub mod types;

pub use error::{Error, Result};
pub use parser::{parse_analysis_response, strip_code_fence};
pub use prompts::{
    build_analysis_prompt, build_narrative_prompt, DEFAULT_BUDGET, DEFAULT_LOCATION,
    DEFAULT_SKILL_LEVEL, NARRATIVE_SYSTEM_PROMPT,
};
pub use types::{
    CostBreakdown, Difficulty, Material, RepairPlan, RepairStep, StructuredAnalysis, TimeEstimate,
    ToolItem,
};
