// file: src/extraction/schema.rs
// description: strict typed parsing of model json into requirement rows
// reference: https://docs.rs/serde_json

use super::patterns::CODE_FENCE;
use crate::error::{PipelineError, Result};
use crate::models::{
    Datatype, DraftSection, Priority, RequirementLogic, RequirementRow, RequirementStatus,
    value_text,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawResponse {
    requirements_table: Vec<RawRequirement>,
    #[serde(default)]
    summary: Option<RawSummary>,
    #[serde(default)]
    draft: Option<RawDraft>,
}

#[derive(Debug, Deserialize)]
struct RawRequirement {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    section: Option<String>,
    priority: String,
    requirement_text: String,
    #[serde(default)]
    normalized_key: Option<String>,
    datatype: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    logic: Option<RawLogic>,
    #[serde(default)]
    answer_value: Option<Value>,
    status: String,
    #[serde(default)]
    source_field: Option<String>,
    #[serde(default)]
    source_attachment: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLogic {
    #[serde(default)]
    threshold_min: Option<Value>,
    #[serde(default)]
    threshold_max: Option<Value>,
    #[serde(default)]
    options: Option<Vec<Value>>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    #[serde(default)]
    critical_gaps: Vec<String>,
    #[serde(default)]
    data_sources_used: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    sections: Vec<RawDraftSection>,
}

#[derive(Debug, Deserialize)]
struct RawDraftSection {
    heading: String,
    content: String,
}

/// One validated model response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub rows: Vec<RequirementRow>,
    pub critical_gaps: Vec<String>,
    pub data_sources_used: Vec<String>,
    pub draft: Option<Vec<DraftSection>>,
}

/// Parse and validate a model response. Rows without an explicit section
/// are assigned `default_section`.
pub fn parse_response(raw: &str, default_section: &str) -> Result<ParsedResponse> {
    let body = match CODE_FENCE.captures(raw) {
        Some(caps) => caps.get(1).map_or(raw, |m| m.as_str()),
        None => raw,
    };

    let parsed: RawResponse = serde_json::from_str(body.trim())
        .map_err(|e| PipelineError::MalformedResponse(format!("invalid json: {}", e)))?;

    let rows = parsed
        .requirements_table
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| convert_row(raw, default_section).map_err(|e| with_row(idx, e)))
        .collect::<Result<Vec<_>>>()?;

    let summary = parsed.summary.unwrap_or_default();
    let draft = parsed
        .draft
        .filter(|d| d.enabled && !d.sections.is_empty())
        .map(|d| {
            d.sections
                .into_iter()
                .map(|s| DraftSection::new(s.heading, s.content))
                .collect()
        });

    Ok(ParsedResponse {
        rows,
        critical_gaps: summary.critical_gaps,
        data_sources_used: summary.data_sources_used,
        draft,
    })
}

fn with_row(idx: usize, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::MalformedResponse(msg) => {
            PipelineError::MalformedResponse(format!("requirement {}: {}", idx + 1, msg))
        }
        other => other,
    }
}

fn convert_row(raw: RawRequirement, default_section: &str) -> Result<RequirementRow> {
    let requirement_text = raw.requirement_text.trim().to_string();
    if requirement_text.is_empty() {
        return Err(PipelineError::MalformedResponse(
            "empty requirement_text".to_string(),
        ));
    }

    let priority: Priority = raw.priority.parse().map_err(PipelineError::MalformedResponse)?;
    let datatype: Datatype = raw.datatype.parse().map_err(PipelineError::MalformedResponse)?;
    let status: RequirementStatus = raw.status.parse().map_err(PipelineError::MalformedResponse)?;

    let logic = raw.logic.unwrap_or_default();

    Ok(RequirementRow {
        id: raw.id.unwrap_or_default(),
        section: non_blank(raw.section).unwrap_or_else(|| default_section.to_string()),
        priority,
        requirement_text,
        normalized_key: non_blank(raw.normalized_key),
        datatype,
        unit: non_blank(raw.unit),
        logic: RequirementLogic {
            threshold_min: logic.threshold_min.as_ref().and_then(number),
            threshold_max: logic.threshold_max.as_ref().and_then(number),
            options: logic
                .options
                .map(|opts| opts.iter().filter_map(value_text).collect::<Vec<_>>())
                .filter(|opts| !opts.is_empty()),
            format: non_blank(logic.format),
        },
        answer_value: raw.answer_value.as_ref().and_then(value_text).and_then(|v| non_blank(Some(v))),
        status,
        source_field: non_blank(raw.source_field),
        source_attachment: non_blank(raw.source_attachment),
        confidence: confidence(raw.confidence.as_ref())?,
        notes: non_blank(raw.notes),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Numbers and numeric strings; anything else counts as absent.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn confidence(value: Option<&Value>) -> Result<f64> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => number(v)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .ok_or_else(|| {
                PipelineError::MalformedResponse(format!("confidence is not a number: {}", v))
            }),
    }
}
