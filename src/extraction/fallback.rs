// file: src/extraction/fallback.rs
// description: deterministic regex extraction used when the model path fails
// reference: keyword and pattern driven requirement detection

use super::patterns::{
    BUDGET, EMPLOYEES, LOCATION, SQUARE_FEET, TECH_KEYWORDS, TIMELINE, first_capture,
};
use crate::models::{
    AnalysisMethod, AnalysisResult, AnalysisSummary, DataFields, Datatype, Priority,
    RequirementLogic, RequirementRow, RequirementStatus, field_text, requirement_id,
};
use regex::Regex;
use tracing::info;

const MISSING_ANSWER: &str = "TODO";

/// One pattern-driven requirement template.
struct FieldRule {
    field: &'static str,
    pattern: &'static Regex,
    section: &'static str,
    priority: Priority,
    label: &'static str,
    datatype: Datatype,
    unit: Option<&'static str>,
}

fn field_rules() -> [FieldRule; 5] {
    [
        FieldRule {
            field: "budget",
            pattern: &BUDGET,
            section: "Financial",
            priority: Priority::High,
            label: "Budget requirement",
            datatype: Datatype::Currency,
            unit: Some("USD"),
        },
        FieldRule {
            field: "timeline",
            pattern: &TIMELINE,
            section: "Schedule",
            priority: Priority::High,
            label: "Timeline requirement",
            datatype: Datatype::Duration,
            unit: Some("days"),
        },
        FieldRule {
            field: "location",
            pattern: &LOCATION,
            section: "Location",
            priority: Priority::Medium,
            label: "Location requirement",
            datatype: Datatype::Text,
            unit: None,
        },
        FieldRule {
            field: "employees",
            pattern: &EMPLOYEES,
            section: "Workforce",
            priority: Priority::Medium,
            label: "Employment requirement",
            datatype: Datatype::Number,
            unit: Some("employees"),
        },
        FieldRule {
            field: "square_feet",
            pattern: &SQUARE_FEET,
            section: "Facility",
            priority: Priority::Medium,
            label: "Facility size requirement",
            datatype: Datatype::Number,
            unit: Some("sq ft"),
        },
    ]
}

pub struct FallbackExtractor {
    critical_gaps_cap: usize,
}

impl FallbackExtractor {
    pub fn new(critical_gaps_cap: usize) -> Self {
        Self { critical_gaps_cap }
    }

    /// Regex-only requirement rows. Never fails; unmatched input yields no rows.
    pub fn extract(&self, text: &str, fields: &DataFields) -> Vec<RequirementRow> {
        let mut rows = Vec::new();

        for rule in field_rules() {
            if let Some(value) = first_capture(rule.pattern, text) {
                rows.push(build_row(
                    rows.len() + 1,
                    rule.section,
                    rule.priority,
                    format!("{}: {}", rule.label, value),
                    rule.field,
                    rule.datatype,
                    rule.unit,
                    fields,
                    "Extracted from RFP text",
                ));
            }
        }

        let lower = text.to_lowercase();
        for word in TECH_KEYWORDS.iter().filter(|w| lower.contains(*w)) {
            let key = format!("tech_{}", word);
            rows.push(build_row(
                rows.len() + 1,
                "Technical",
                Priority::High,
                format!("Technical capability: {} solution required", word),
                &key,
                Datatype::Boolean,
                None,
                fields,
                "Inferred from RFP content",
            ));
        }

        rows
    }

    /// Rows plus a summary computed entirely from them.
    pub fn analyze(&self, text: &str, fields: &DataFields) -> AnalysisResult {
        let requirements = self.extract(text, fields);
        let summary = AnalysisSummary::from_rows(&requirements, self.critical_gaps_cap);

        info!(
            requirements = requirements.len(),
            met = summary.met,
            not_met = summary.not_met,
            unknown = summary.unknown,
            "regex analysis completed"
        );

        AnalysisResult {
            requirements,
            summary,
            method: AnalysisMethod::Regex,
        }
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new(10)
    }
}

#[allow(clippy::too_many_arguments)]
fn build_row(
    number: usize,
    section: &str,
    priority: Priority,
    requirement_text: String,
    field: &str,
    datatype: Datatype,
    unit: Option<&str>,
    fields: &DataFields,
    notes: &str,
) -> RequirementRow {
    let answer = field_text(fields, field);
    let status = if fields.contains_key(field) {
        RequirementStatus::Met
    } else {
        RequirementStatus::Unknown
    };

    RequirementRow {
        id: requirement_id(number),
        section: section.to_string(),
        priority,
        requirement_text,
        normalized_key: Some(field.to_string()),
        datatype,
        unit: unit.map(str::to_string),
        logic: RequirementLogic::default(),
        answer_value: Some(answer.unwrap_or_else(|| MISSING_ANSWER.to_string())),
        status,
        source_field: fields.contains_key(field).then(|| field.to_string()),
        source_attachment: None,
        confidence: 0.0,
        notes: Some(notes.to_string()),
    }
}
