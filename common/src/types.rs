//! Repair analysis types
//!
//! - StructuredAnalysis: the document returned by the analysis stage, kept as decoded
//! - RepairPlan: canonical typed view over both schema variants the model produces
//!
//! The model is free to omit fields or use either variant (plain tool names vs.
//! tool objects, `cost` vs. `costEstimate`, camelCase vs. snake_case keys), so the
//! typed view is built leniently and never fails.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Decoded analysis document.
///
/// Unknown fields are preserved and no field types are enforced; equality is
/// field-for-field over the decoded JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredAnalysis(Map<String, Value>);

impl StructuredAnalysis {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty JSON text of the document, exactly as it will be shown to the narrative stage.
    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", Value::Object(self.0.clone()))
    }

    /// Canonical typed view.
    pub fn plan(&self) -> RepairPlan {
        RepairPlan::from_document(&self.0)
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        get_string(&self.0, &["difficulty"]).map(|s| Difficulty::parse(&s))
    }
}

impl From<Map<String, Value>> for StructuredAnalysis {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Difficulty rating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    /// Anything the model wrote that is not one of the three ratings
    Other(String),
}

impl Difficulty {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Difficulty::Beginner,
            "intermediate" | "moderate" | "medium" => Difficulty::Intermediate,
            "advanced" | "hard" | "expert" => Difficulty::Advanced,
            _ => Difficulty::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Other(s) => s,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: String,
    pub estimated_unit_cost: Option<f64>,
    pub notes: String,
}

/// Tool entry. Plain tool names map to `required: true` with no other details.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolItem {
    pub name: String,
    pub required: bool,
    pub estimated_cost: Option<f64>,
    pub can_rent: Option<bool>,
    pub purpose: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairStep {
    pub step_number: u32,
    pub title: String,
    pub details: String,
    pub estimated_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeEstimate {
    pub active_time_minutes: Option<f64>,
    pub drying_or_wait_time_minutes: Option<f64>,
    pub total_calendar_time_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub currency: String,
    pub diy_materials_cost_estimate: Option<f64>,
    pub diy_tool_rental_cost_estimate: Option<f64>,
    pub pro_labor_cost_estimate: Option<f64>,
    pub pro_total_cost_estimate: Option<f64>,
    pub notes: String,
}

impl CostBreakdown {
    /// Materials plus tool rental, when at least one of them is known
    pub fn diy_total(&self) -> Option<f64> {
        match (self.diy_materials_cost_estimate, self.diy_tool_rental_cost_estimate) {
            (None, None) => None,
            (materials, rental) => Some(materials.unwrap_or(0.0) + rental.unwrap_or(0.0)),
        }
    }
}

/// Canonical repair plan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairPlan {
    pub diagnosis: String,
    pub project_category: Option<String>,
    pub scope: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub materials: Vec<Material>,
    pub tools: Vec<ToolItem>,
    pub steps: Vec<RepairStep>,
    pub time_estimate: Option<TimeEstimate>,
    pub cost: Option<CostBreakdown>,
    pub safety_notes: Vec<String>,
    pub should_call_professional: bool,
    pub professional_escalation_reasons: Vec<String>,
}

impl RepairPlan {
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let materials = get_array(doc, &["materials"])
            .iter()
            .filter_map(Value::as_object)
            .map(material_from)
            .collect();

        let tools = get_array(doc, &["tools"])
            .iter()
            .filter_map(tool_from)
            .collect();

        let steps = get_array(doc, &["steps"])
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| step_from(idx, v))
            .collect();

        RepairPlan {
            diagnosis: get_string(doc, &["diagnosis"]).unwrap_or_default(),
            project_category: get_string(doc, &["projectCategory", "project_category"]),
            scope: get_string(doc, &["scope"]),
            difficulty: get_string(doc, &["difficulty"]).map(|s| Difficulty::parse(&s)),
            materials,
            tools,
            steps,
            time_estimate: get_object(doc, &["timeEstimate", "time_estimate"]).map(time_from),
            cost: get_object(
                doc,
                &["cost", "costEstimate", "cost_estimate", "costBreakdown", "cost_breakdown"],
            )
            .map(cost_from),
            safety_notes: get_string_list(doc, &["safetyNotes", "safety_notes"]),
            should_call_professional: get_bool(
                doc,
                &["shouldCallProfessional", "should_call_professional"],
            )
            .unwrap_or(false),
            professional_escalation_reasons: get_string_list(
                doc,
                &[
                    "professionalEscalationReasons",
                    "professional_escalation_reasons",
                    "escalationReasons",
                ],
            ),
        }
    }

    /// Sum of quantity x unit cost over materials that carry both numbers
    pub fn estimated_materials_cost(&self) -> f64 {
        self.materials
            .iter()
            .filter_map(|m| Some(m.quantity? * m.estimated_unit_cost?))
            .sum()
    }

    /// Active minutes from the time block, falling back to the sum of step estimates
    pub fn active_minutes(&self) -> Option<f64> {
        if let Some(active) = self.time_estimate.as_ref().and_then(|t| t.active_time_minutes) {
            return Some(active);
        }
        let minutes: Vec<u32> = self
            .steps
            .iter()
            .filter_map(|s| s.estimated_time_minutes)
            .collect();
        if minutes.is_empty() {
            None
        } else {
            Some(minutes.iter().map(|&m| f64::from(m)).sum())
        }
    }
}

fn material_from(map: &Map<String, Value>) -> Material {
    Material {
        name: get_string(map, &["name"]).unwrap_or_default(),
        quantity: get_number(map, &["quantity", "qty"]),
        unit: get_string(map, &["unit"]).unwrap_or_default(),
        estimated_unit_cost: get_number(
            map,
            &["estimated_unit_cost", "estimatedUnitCost", "unit_cost"],
        ),
        notes: get_string(map, &["notes"]).unwrap_or_default(),
    }
}

fn tool_from(value: &Value) -> Option<ToolItem> {
    match value {
        Value::String(name) => Some(ToolItem {
            name: name.clone(),
            required: true,
            ..Default::default()
        }),
        Value::Object(map) => Some(ToolItem {
            name: get_string(map, &["name"]).unwrap_or_default(),
            required: get_bool(map, &["required"]).unwrap_or(true),
            estimated_cost: get_number(map, &["estimated_cost", "estimatedCost", "cost"]),
            can_rent: get_bool(map, &["can_rent", "canRent", "rentable"]),
            purpose: get_string(map, &["purpose", "notes"]).unwrap_or_default(),
        }),
        _ => None,
    }
}

fn step_from(idx: usize, value: &Value) -> Option<RepairStep> {
    let fallback_number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
    match value {
        Value::String(text) => Some(RepairStep {
            step_number: fallback_number,
            details: text.clone(),
            ..Default::default()
        }),
        Value::Object(map) => Some(RepairStep {
            step_number: get_number(map, &["step_number", "stepNumber", "step", "number"])
                .map(|n| n as u32)
                .unwrap_or(fallback_number),
            title: get_string(map, &["title"]).unwrap_or_default(),
            details: get_string(map, &["details", "description", "instructions"])
                .unwrap_or_default(),
            estimated_time_minutes: get_number(
                map,
                &["estimated_time_minutes", "estimatedTimeMinutes", "time_minutes"],
            )
            .map(|n| n as u32),
        }),
        _ => None,
    }
}

fn time_from(map: &Map<String, Value>) -> TimeEstimate {
    TimeEstimate {
        active_time_minutes: get_number(map, &["active_time_minutes", "activeTimeMinutes"]),
        drying_or_wait_time_minutes: get_number(
            map,
            &[
                "drying_or_wait_time_minutes",
                "dryingOrWaitTimeMinutes",
                "wait_time_minutes",
            ],
        ),
        total_calendar_time_hours: get_number(
            map,
            &["total_calendar_time_hours", "totalCalendarTimeHours"],
        ),
    }
}

fn cost_from(map: &Map<String, Value>) -> CostBreakdown {
    CostBreakdown {
        currency: get_string(map, &["currency"]).unwrap_or_else(|| "USD".to_string()),
        diy_materials_cost_estimate: get_number(
            map,
            &[
                "diy_materials_cost_estimate",
                "diy_materials_cost",
                "materials_cost",
                "diyMaterialsCost",
            ],
        ),
        diy_tool_rental_cost_estimate: get_number(
            map,
            &[
                "diy_tool_rental_cost_estimate",
                "diy_tool_rental_cost",
                "tool_rental_cost",
                "diyToolRentalCost",
            ],
        ),
        pro_labor_cost_estimate: get_number(
            map,
            &["pro_labor_cost_estimate", "pro_labor_cost", "labor_cost", "proLaborCost"],
        ),
        pro_total_cost_estimate: get_number(
            map,
            &[
                "pro_total_cost_estimate",
                "pro_total_cost",
                "professional_total_cost",
                "proTotalCost",
            ],
        ),
        notes: get_string(map, &["notes"]).unwrap_or_default(),
    }
}

// =============================================
// Lenient field access
// =============================================

fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

fn get_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    let value = field(map, keys)?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    Some(value.to_string())
}

fn get_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let value = field(map, keys)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    // string forms such as "$12.50" or "3"
    value
        .as_str()
        .and_then(|s| s.trim().trim_start_matches('$').replace(',', "").parse().ok())
}

fn get_bool(map: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    let value = field(map, keys)?;
    if let Some(b) = value.as_bool() {
        return Some(b);
    }
    if let Some(s) = value.as_str() {
        return Some(matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"));
    }
    None
}

fn get_array<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    field(map, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn get_object<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    field(map, keys).and_then(Value::as_object)
}

fn get_string_list(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    match field(map, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
