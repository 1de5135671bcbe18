// file: src/extraction/prompt.rs
// description: prompt builders for whole-document and per-section extraction
// reference: json-mode chat completion prompts

use crate::models::{DataFields, requirement_id};
use serde_json::json;

/// What the caller intends to do with the extracted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionAction {
    Analyze,
    Draft,
}

impl ExtractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Draft => "draft",
        }
    }
}

/// A `(system, user)` message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SINGLE_SYSTEM: &str = "You help economic development teams respond to RFPs. \
Return ONLY valid JSON matching the requested schema. \
Use the knowledge base context when it is relevant and cite its documents in notes.";

const FIELD_CATALOG: &str = "\
Location & Infrastructure: city, state, cbsa, population, major_highway_access, rail_access, airport_distance_miles
Sites & Utilities: available_industrial_acres, industrial_power_cents_kwh, broadband_100_20_pct, permitting_days_major
Workforce & Education: stem_share_pct, manufacturing_emp_share_pct, university_research_usd_m, workforce_training_programs
Economic Indicators: median_income_usd, median_rent_usd, logistics_index
Incentives & Programs: tax_increment_financing, enterprise_zone_benefits, property_tax_abatement, job_creation_tax_credit, research_development_credit";

const NO_CONTEXT: &str = "No additional context available from knowledge base.";

fn row_schema(first_id: &str, section: &str) -> String {
    format!(
        r#"{{
  "requirements_table": [
    {{
      "id": "{first_id}",
      "section": "{section}",
      "priority": "high" | "medium" | "low",
      "requirement_text": "verbatim requirement",
      "normalized_key": "snake_case_key or null",
      "datatype": "number" | "text" | "boolean" | "date" | "file" | "currency" | "duration",
      "unit": "string or null",
      "logic": {{"threshold_min": null, "threshold_max": null, "options": null, "format": null}},
      "answer_value": "string or null",
      "status": "Met" | "Not Met" | "Unknown",
      "source_field": "features.field_name or null",
      "source_attachment": null,
      "confidence": 0.0,
      "notes": "short rationale or TODO"
    }}
  ],
  "summary": {{
    "critical_gaps": ["high-priority missing items"],
    "data_sources_used": ["features.field_name"]
  }}"#
    )
}

fn payload(fields: &DataFields) -> String {
    serde_json::to_string_pretty(&json!({ "features": fields, "attachments": [] }))
        .unwrap_or_else(|_| "{}".to_string())
}

fn context_block(kb_context: &str) -> &str {
    if kb_context.trim().is_empty() {
        NO_CONTEXT
    } else {
        kb_context
    }
}

/// Prompt covering the whole document in one call.
pub fn single_shot(
    text: &str,
    fields: &DataFields,
    action: ExtractionAction,
    kb_context: &str,
) -> Prompt {
    let draft_schema = match action {
        ExtractionAction::Draft => {
            r#",
  "draft": {
    "enabled": true,
    "sections": [{"heading": "Location & Infrastructure", "content": "markdown"}]
  }"#
        }
        ExtractionAction::Analyze => "",
    };

    let user = format!(
        "Extract a deduplicated table of requirements from the RFP below, then answer each \
requirement using ONLY the data payload.

RULES
- Do not invent facts. Unanswerable requirements get status \"Unknown\" and a TODO note.
- Every answered requirement names its source_field (for example \"features.stem_share_pct\").
- priority is high when the RFP says must or shall.
- Partially satisfied thresholds are \"Not Met\" with the gap explained in notes.
- Number requirements sequentially starting at {first_id}.
- When user_action is draft, add a draft built only from answered requirements.

OUTPUT JSON SCHEMA
{schema}{draft_schema}
}}

RFP TEXT:
{text}

AVAILABLE DATA FIELDS:
{catalog}

DATA PAYLOAD:
{payload}

USER_ACTION: {action}

KNOWLEDGE BASE CONTEXT:
{context}

Return the JSON response now:",
        first_id = requirement_id(1),
        schema = row_schema(&requirement_id(1), "Section name"),
        draft_schema = draft_schema,
        text = text,
        catalog = FIELD_CATALOG,
        payload = payload(fields),
        action = action.as_str(),
        context = context_block(kb_context),
    );

    Prompt {
        system: SINGLE_SYSTEM.to_string(),
        user,
    }
}

/// Prompt for one section of a long document. Numbering starts at `next_id`.
pub fn section(
    header: &str,
    body: &str,
    fields: &DataFields,
    next_id: usize,
    kb_context: &str,
) -> Prompt {
    let first_id = requirement_id(next_id);
    let system = format!(
        "You are processing section '{}' of an RFP. Extract requirements from this section only. Return valid JSON.",
        header
    );

    let user = format!(
        "You are processing the \"{header}\" section of an RFP document.

RULES
- Extract only requirements explicitly stated in this section.
- Answer using ONLY the data payload.
- Start requirement ids at {first_id} and count up without gaps.
- Return valid JSON following the schema exactly.

OUTPUT JSON SCHEMA
{schema}
}}

SECTION CONTENT:
{body}

AVAILABLE DATA FIELDS:
{catalog}

DATA PAYLOAD:
{payload}

KNOWLEDGE BASE CONTEXT:
{context}

Return the JSON response now:",
        header = header,
        first_id = first_id,
        schema = row_schema(&first_id, header),
        body = body,
        catalog = FIELD_CATALOG,
        payload = payload(fields),
        context = context_block(kb_context),
    );

    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> DataFields {
        serde_json::from_str(r#"{"city": "Columbus", "stem_share_pct": 16.5}"#).unwrap()
    }

    #[test]
    fn test_section_prompt_names_start_id_and_section() {
        let prompt = section("2. Site Requirements", "Must have rail.", &fields(), 12, "");
        assert!(prompt.system.contains("'2. Site Requirements'"));
        assert!(prompt.user.contains("Start requirement ids at REQ-012"));
        assert!(prompt.user.contains("\"id\": \"REQ-012\""));
        assert!(prompt.user.contains("Must have rail."));
        assert!(prompt.user.contains("\"stem_share_pct\": 16.5"));
        assert!(prompt.user.contains(NO_CONTEXT));
    }

    #[test]
    fn test_single_shot_draft_schema_only_when_drafting() {
        let analyze = single_shot("RFP", &fields(), ExtractionAction::Analyze, "Source: Ohio");
        let draft = single_shot("RFP", &fields(), ExtractionAction::Draft, "");

        assert!(!analyze.user.contains("\"draft\""));
        assert!(analyze.user.contains("Source: Ohio"));
        assert!(draft.user.contains("\"draft\""));
        assert!(draft.user.contains("USER_ACTION: draft"));
    }
}
