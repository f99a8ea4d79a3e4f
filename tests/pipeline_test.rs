//! Pipeline tests
//!
//! End-to-end runs against in-process completion doubles.

use async_trait::async_trait;
use repair_advisor::analyzer::{
    AnalyzerSettings, ErrorKind, Humanizer, HumanizerSettings, Pipeline, RepairAnalyzer, Stage,
};
use repair_advisor::completion::{
    Completion, CompletionError, CompletionRequest, CompletionService, GeminiClient, Reply,
    ScriptedCompletion,
};
use repair_advisor::error::AdvisorError;
use repair_advisor::request::{ImageInput, RepairRequest};
use repair_advisor_common::{Difficulty, StructuredAnalysis};
use std::sync::Arc;
use std::time::Duration;

const DRYWALL_PLAN: &str = r#"{
  "diagnosis": "A 6 inch stress crack in the drywall above the door frame",
  "difficulty": "Beginner",
  "materials": [
    {"name": "Lightweight spackle", "quantity": 1, "unit": "tub", "estimated_unit_cost": 8.5, "notes": ""},
    {"name": "Paper joint tape", "quantity": 1, "unit": "roll", "estimated_unit_cost": 4.0, "notes": ""}
  ],
  "tools": [
    {"name": "6 inch putty knife", "required": true, "estimated_cost": 7, "can_rent": false, "purpose": "apply compound"},
    {"name": "Sanding sponge", "required": true, "estimated_cost": 4, "can_rent": false, "purpose": "smooth patch"}
  ],
  "steps": [
    {"step_number": 1, "title": "Open the crack", "details": "Widen slightly with a utility knife.", "estimated_time_minutes": 10},
    {"step_number": 2, "title": "Tape and fill", "details": "Embed tape, then apply two thin coats.", "estimated_time_minutes": 30},
    {"step_number": 3, "title": "Sand and paint", "details": "Sand smooth once dry and repaint.", "estimated_time_minutes": 20}
  ],
  "timeEstimate": {"active_time_minutes": 60, "drying_or_wait_time_minutes": 720, "total_calendar_time_hours": 24},
  "cost": {"currency": "USD", "diy_materials_cost_estimate": 12.5, "diy_tool_rental_cost_estimate": 0,
           "pro_labor_cost_estimate": 150, "pro_total_cost_estimate": 175, "notes": "Varies by region"},
  "safetyNotes": ["Wear a dust mask while sanding"],
  "shouldCallProfessional": false,
  "professionalEscalationReasons": []
}"#;

const NARRATIVE: &str = "Good news: that crack above your door is a classic settling crack and a very \
doable weekend fix. 1. Open the crack slightly. 2. Tape and fill it. 3. Sand and paint.";

fn jpeg() -> ImageInput {
    ImageInput::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'], "image/jpeg")
}

fn drywall_request() -> RepairRequest {
    RepairRequest::new("crack in drywall about 6 inches long").with_image(jpeg())
}

fn pipeline_with(service: Arc<dyn CompletionService>) -> Pipeline {
    Pipeline::new(
        RepairAnalyzer::new(service.clone(), AnalyzerSettings::default()),
        Humanizer::new(service, HumanizerSettings::default()),
    )
}

fn document(text: &str) -> StructuredAnalysis {
    serde_json::from_str(text).expect("fixture must be valid JSON")
}

// =============================================
// End to end
// =============================================

#[tokio::test]
async fn test_drywall_end_to_end() {
    let service = Arc::new(ScriptedCompletion::texts([DRYWALL_PLAN, NARRATIVE]));
    let outcome = pipeline_with(service.clone()).run(drywall_request()).await.unwrap();

    assert!(outcome.success);
    let data = outcome.data.as_ref().expect("data missing");
    assert_eq!(data, &document(DRYWALL_PLAN));
    assert_eq!(data.difficulty(), Some(Difficulty::Beginner));

    let human_text = outcome.human_text.as_deref().expect("narrative missing");
    assert!(!human_text.is_empty());
    assert_ne!(human_text, DRYWALL_PLAN);
    assert_eq!(outcome.metadata.as_ref().map(|m| m.model_used.as_str()), Some("gpt-4o"));

    // vision call first, narrative second
    let requests = service.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].has_image());
    assert!(!requests[1].has_image());
    assert!(requests[1].text().contains("crack in drywall about 6 inches long"));
}

#[tokio::test]
async fn test_plan_view_of_result() {
    let service = Arc::new(ScriptedCompletion::texts([DRYWALL_PLAN, NARRATIVE]));
    let outcome = pipeline_with(service).run(drywall_request()).await.unwrap();

    let plan = outcome.data.expect("data missing").plan();
    assert_eq!(plan.steps.len(), 3);
    assert_eq!(plan.tools.len(), 2);
    assert_eq!(plan.estimated_materials_cost(), 12.5);
    assert_eq!(plan.active_minutes(), Some(60.0));
    assert!(!plan.should_call_professional);
}

#[tokio::test]
async fn test_fenced_reply_matches_plain_reply() {
    let plain = Arc::new(ScriptedCompletion::texts([DRYWALL_PLAN, NARRATIVE]));
    let fenced_text = format!("```json\n{}\n```", DRYWALL_PLAN);
    let fenced = Arc::new(ScriptedCompletion::texts([fenced_text.as_str(), NARRATIVE]));

    let a = pipeline_with(plain).run(drywall_request()).await.unwrap();
    let b = pipeline_with(fenced).run(drywall_request()).await.unwrap();

    assert!(b.success);
    assert_eq!(a.data, b.data);
}

#[tokio::test]
async fn test_outcome_json_uses_camel_case() {
    let service = Arc::new(ScriptedCompletion::texts([DRYWALL_PLAN, NARRATIVE]));
    let outcome = pipeline_with(service).run(drywall_request()).await.unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["humanText"], NARRATIVE);
    assert_eq!(value["data"]["difficulty"], "Beginner");
    assert_eq!(value["metadata"]["modelUsed"], "gpt-4o");
    assert!(value.get("errorKind").is_none());
}

// =============================================
// Failures
// =============================================

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let service = Arc::new(ScriptedCompletion::texts(["{not json"]));
    let outcome = pipeline_with(service.clone()).run(drywall_request()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::ParseError));
    assert_eq!(outcome.stage, Some(Stage::Analysis));
    assert!(outcome.human_text.is_none());
    // humanization never runs after a failed analysis
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_transport_fault_is_transport_error() {
    let service = Arc::new(ScriptedCompletion::new([Reply::Status(401, "Incorrect API key provided".into())]));
    let outcome = pipeline_with(service.clone()).run(drywall_request()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::TransportError));
    assert!(!outcome.error.as_deref().unwrap_or_default().is_empty());
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_unreachable_provider_keeps_api_key_out_of_outcome() {
    let client = GeminiClient::new("SECRET-KEY-123", "http://127.0.0.1:9", Duration::from_secs(5))
        .expect("client build failed");
    let outcome = pipeline_with(Arc::new(client)).run(drywall_request()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::TransportError));
    let json = serde_json::to_string(&outcome).unwrap();
    assert!(!json.contains("SECRET-KEY-123"), "api key in outcome: {}", json);
}

#[tokio::test]
async fn test_failure_converts_to_advisor_error() {
    let service = Arc::new(ScriptedCompletion::texts(["[]"]));
    let outcome = pipeline_with(service).run(drywall_request()).await.unwrap();

    let err: AdvisorError = outcome.failure().expect("should fail").into();
    assert!(matches!(err, AdvisorError::AnalysisFailed { ref kind, .. } if kind == "parse_error"));
}

#[tokio::test]
async fn test_missing_inputs_rejected_before_any_call() {
    let cases = vec![
        RepairRequest::new("").with_image(jpeg()),
        RepairRequest::new("  \n ").with_image(jpeg()),
        RepairRequest::new("crack in drywall"),
        RepairRequest::new("crack in drywall").with_image(ImageInput::from_bytes(Vec::new(), "image/jpeg")),
    ];

    for request in cases {
        let service = Arc::new(ScriptedCompletion::texts([DRYWALL_PLAN, NARRATIVE]));
        let result = pipeline_with(service.clone()).run(request).await;

        assert!(matches!(result, Err(AdvisorError::InvalidRequest(_))));
        assert_eq!(service.calls(), 0);
    }
}

// =============================================
// Narrative style rules
// =============================================

/// Double that follows the style rules only when the prompt states them
struct StyleAwareCompletion;

#[async_trait]
impl CompletionService for StyleAwareCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CompletionError> {
        if request.has_image() {
            return Ok(Completion::text(DRYWALL_PLAN));
        }

        let prompt = request.text();
        let rules_present = prompt.contains("Do not use Markdown")
            && prompt.contains("1. ... 2. ... 3. ...")
            && prompt.contains("between 300 and 600 words")
            && prompt.contains("Do NOT show the JSON");

        let reply = if rules_present {
            NARRATIVE.to_string()
        } else {
            format!("# Your repair\n\n**Easy!**\n\n```json\n{}\n```", DRYWALL_PLAN)
        };
        Ok(Completion::text(reply))
    }
}

#[tokio::test]
async fn test_narrative_honours_style_rules() {
    let outcome = pipeline_with(Arc::new(StyleAwareCompletion))
        .run(drywall_request())
        .await
        .unwrap();

    let text = outcome.human_text.expect("narrative missing");
    assert!(!text.contains("```"));
    assert!(!text.contains("**"));
    assert!(!text.lines().any(|line| line.starts_with("# ")));
}
