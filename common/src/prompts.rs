//! Prompt templates
//!
//! - build_analysis_prompt: structured analysis (sent together with the photo)
//! - build_narrative_prompt: plain-language restatement of a finished analysis
//! - NARRATIVE_SYSTEM_PROMPT: persona for the narrative stage

/// Fallback profile values used when the user leaves a field blank
pub const DEFAULT_SKILL_LEVEL: &str = "beginner";
pub const DEFAULT_BUDGET: &str = "moderate";
pub const DEFAULT_LOCATION: &str = "United States";

pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are a friendly, expert home repair advisor. \
You are talking to a non-expert homeowner. Be clear, encouraging, and practical.";

/// Structured analysis prompt
///
/// # Arguments
/// * `description` - the user's own description of the problem
/// * `skill_level` - DIY skill level (e.g. "beginner")
/// * `budget` - budget preference (e.g. "moderate")
/// * `location` - location used for price estimates
///
/// # Returns
/// Instruction text asking for a single JSON object in the repair-plan shape
pub fn build_analysis_prompt(
    description: &str,
    skill_level: &str,
    budget: &str,
    location: &str,
) -> String {
    format!(
        r#"You are an expert home repair and renovation advisor.

The user has uploaded a photo of a real home repair or renovation situation.
You are given:
- A natural language description of the problem and what they want to achieve
- Their DIY skill level
- Their budget preference
- Their location (for pricing estimates)

User description:
"""{description}"""

User skill level: {skill_level}
Budget preference: {budget}
Location (for pricing): {location}

You MUST respond with valid JSON only, no extra text, with this structure:

{{
  "diagnosis": "Short summary of what the issue is based on the image + text.",
  "projectCategory": "small_repair or renovation",
  "scope": "One or two sentences describing the overall scope of the work.",
  "materials": [
    {{
      "name": "Name of material",
      "quantity": 0,
      "unit": "piece / ft / sq ft / liter / etc",
      "estimated_unit_cost": 0.0,
      "notes": "Any important selection details."
    }}
  ],
  "tools": [
    {{
      "name": "Name of tool",
      "required": true,
      "estimated_cost": 0.0,
      "can_rent": false,
      "purpose": "What the tool is used for."
    }}
  ],
  "steps": [
    {{
      "step_number": 1,
      "title": "Short step title",
      "details": "Clear, actionable instructions tailored to the photo.",
      "estimated_time_minutes": 0
    }}
  ],
  "timeEstimate": {{
    "active_time_minutes": 0,
    "drying_or_wait_time_minutes": 0,
    "total_calendar_time_hours": 0
  }},
  "difficulty": "Beginner or Intermediate or Advanced",
  "cost": {{
    "currency": "USD",
    "diy_materials_cost_estimate": 0.0,
    "diy_tool_rental_cost_estimate": 0.0,
    "pro_labor_cost_estimate": 0.0,
    "pro_total_cost_estimate": 0.0,
    "notes": "Any key assumptions or caveats about cost."
  }},
  "safetyNotes": [
    "Safety note 1",
    "Safety note 2"
  ],
  "shouldCallProfessional": false,
  "professionalEscalationReasons": [
    "Reason 1 they should call a pro",
    "Reason 2 they should call a pro"
  ]
}}

Remember: output ONLY JSON. No markdown, no explanation."#
    )
}

/// Narrative prompt
///
/// The analysis JSON is embedded verbatim. The style rules are instructions to the
/// model only; nothing checks that the reply honours them.
///
/// # Arguments
/// * `analysis_json` - pretty JSON of the structured analysis
/// * `original_description` - the user's description, unchanged
pub fn build_narrative_prompt(analysis_json: &str, original_description: &str) -> String {
    format!(
        r#"The user originally described their problem as:

"""{original_description}"""

Here is a structured analysis of their situation as JSON:

{analysis_json}

Using ONLY the information in that analysis, speak to the user like a real contractor would.
Briefly restate what the problem is in plain language. Tell them whether this is reasonable
for them to do themselves given the difficulty. Summarize the estimated time and cost, both
for doing it themselves and for hiring a pro. Give a high-level step-by-step plan that is not
too technical. Mention any important safety warnings. If the analysis suggests they should
call a professional, be honest about that and explain why.

Style rules:
Write conversational prose in short paragraphs.
Do not use Markdown or any markup: no heading markers, no bold or italic markers, no bullet lists, no code blocks.
When you list steps, write them inline in the sentence as 1. ... 2. ... 3. ...
Keep the answer between 300 and 600 words.
Do NOT show the JSON or mention that you were given JSON."#
    )
}
