// file: src/models/requirement.rs
// description: extracted requirement rows, analysis summary and result models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    Number,
    Text,
    Boolean,
    Date,
    File,
    Currency,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Met,
    NotMet,
    Unknown,
}

/// Lowercase, trim and fold spaces/hyphens to underscores so that
/// `"Not Met"`, `"not-met"` and `"NOT_MET"` compare equal.
fn fold_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "high" | "critical" => Ok(Self::High),
            "medium" | "normal" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "number" | "numeric" | "integer" | "float" => Ok(Self::Number),
            "text" | "string" => Ok(Self::Text),
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "file" => Ok(Self::File),
            "currency" => Ok(Self::Currency),
            "duration" => Ok(Self::Duration),
            other => Err(format!("unknown datatype '{}'", other)),
        }
    }
}

impl FromStr for RequirementStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "met" => Ok(Self::Met),
            "not_met" | "unmet" => Ok(Self::NotMet),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Met => "met",
            Self::NotMet => "not_met",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementLogic {
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub options: Option<Vec<String>>,
    pub format: Option<String>,
}

impl RequirementLogic {
    pub fn is_empty(&self) -> bool {
        self.threshold_min.is_none()
            && self.threshold_max.is_none()
            && self.options.is_none()
            && self.format.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRow {
    pub id: String,
    pub section: String,
    pub priority: Priority,
    pub requirement_text: String,
    pub normalized_key: Option<String>,
    pub datatype: Datatype,
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "RequirementLogic::is_empty")]
    pub logic: RequirementLogic,
    pub answer_value: Option<String>,
    pub status: RequirementStatus,
    pub source_field: Option<String>,
    pub source_attachment: Option<String>,
    pub confidence: f64,
    pub notes: Option<String>,
}

/// Caller-supplied facts (`city`, `stem_share_pct`, ...) used to answer requirements.
pub type DataFields = serde_json::Map<String, Value>;

/// A data field rendered as display text. Strings are taken verbatim.
pub fn field_text(fields: &DataFields, key: &str) -> Option<String> {
    fields.get(key).and_then(value_text)
}

pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Render the sequential requirement number as `REQ-001`.
pub fn requirement_id(number: usize) -> String {
    format!("REQ-{:03}", number)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub met: usize,
    pub not_met: usize,
    pub unknown: usize,
    pub critical_gaps: Vec<String>,
    pub data_sources_used: Vec<String>,
}

impl AnalysisSummary {
    /// Status counts recomputed from the rows themselves.
    pub fn count_statuses(rows: &[RequirementRow]) -> (usize, usize, usize) {
        rows.iter()
            .fold((0, 0, 0), |(met, not_met, unknown), row| match row.status {
                RequirementStatus::Met => (met + 1, not_met, unknown),
                RequirementStatus::NotMet => (met, not_met + 1, unknown),
                RequirementStatus::Unknown => (met, not_met, unknown + 1),
            })
    }

    /// Summary derived entirely from rows: gaps are unmet high-priority
    /// requirements, sources are the distinct `source_field`s.
    pub fn from_rows(rows: &[RequirementRow], gaps_cap: usize) -> Self {
        let (met, not_met, unknown) = Self::count_statuses(rows);

        let critical_gaps = rows
            .iter()
            .filter(|r| r.status == RequirementStatus::NotMet && r.priority == Priority::High)
            .map(|r| r.requirement_text.clone())
            .take(gaps_cap)
            .collect();

        let mut seen = HashSet::new();
        let data_sources_used = rows
            .iter()
            .filter_map(|r| r.source_field.clone())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        Self {
            met,
            not_met,
            unknown,
            critical_gaps,
            data_sources_used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    Llm,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub requirements: Vec<RequirementRow>,
    pub summary: AnalysisSummary,
    pub method: AnalysisMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: usize, status: RequirementStatus, priority: Priority) -> RequirementRow {
        RequirementRow {
            id: requirement_id(id),
            section: "Sites".to_string(),
            priority,
            requirement_text: format!("Requirement {}", id),
            normalized_key: None,
            datatype: Datatype::Text,
            unit: None,
            logic: RequirementLogic::default(),
            answer_value: None,
            status,
            source_field: Some(format!("features.field_{}", id % 2)),
            source_attachment: None,
            confidence: 0.5,
            notes: None,
        }
    }

    #[test]
    fn test_status_labels_fold() {
        assert_eq!("Not Met".parse(), Ok(RequirementStatus::NotMet));
        assert_eq!("not-met".parse(), Ok(RequirementStatus::NotMet));
        assert_eq!("Met".parse(), Ok(RequirementStatus::Met));
        assert_eq!(" UNKNOWN ".parse(), Ok(RequirementStatus::Unknown));
        assert!("maybe".parse::<RequirementStatus>().is_err());
    }

    #[test]
    fn test_priority_and_datatype_parse() {
        assert_eq!("High".parse(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("number".parse(), Ok(Datatype::Number));
        assert!("matrix".parse::<Datatype>().is_err());
    }

    #[test]
    fn test_requirement_id_round_trip() {
        assert_eq!(requirement_id(7), "REQ-007");
        assert_eq!(requirement_id(1234), "REQ-1234");
    }

    #[test]
    fn test_empty_logic_is_omitted_from_json() {
        let mut bare = row(1, RequirementStatus::Met, Priority::High);
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("logic").is_none());

        let restored: RequirementRow = serde_json::from_value(value).unwrap();
        assert_eq!(restored.logic, RequirementLogic::default());

        bare.logic.threshold_min = Some(100.0);
        let value = serde_json::to_value(&bare).unwrap();
        assert_eq!(value["logic"]["threshold_min"], 100.0);
    }

    #[test]
    fn test_summary_from_rows() {
        let rows = vec![
            row(1, RequirementStatus::Met, Priority::High),
            row(2, RequirementStatus::NotMet, Priority::High),
            row(3, RequirementStatus::NotMet, Priority::Low),
            row(4, RequirementStatus::Unknown, Priority::Medium),
        ];
        let summary = AnalysisSummary::from_rows(&rows, 10);

        assert_eq!((summary.met, summary.not_met, summary.unknown), (1, 2, 1));
        assert_eq!(summary.critical_gaps, vec!["Requirement 2".to_string()]);
        assert_eq!(
            summary.data_sources_used,
            vec!["features.field_1".to_string(), "features.field_0".to_string()]
        );
    }

    #[test]
    fn test_field_text() {
        let fields: DataFields = serde_json::from_str(
            r#"{"city": "Columbus", "population": 2100000, "rail": true, "gap": null}"#,
        )
        .unwrap();
        assert_eq!(field_text(&fields, "city").as_deref(), Some("Columbus"));
        assert_eq!(field_text(&fields, "population").as_deref(), Some("2100000"));
        assert_eq!(field_text(&fields, "rail").as_deref(), Some("true"));
        assert_eq!(field_text(&fields, "gap"), None);
        assert_eq!(field_text(&fields, "missing"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RequirementStatus::NotMet).unwrap();
        assert_eq!(json, "\"not_met\"");
    }
}
