// file: src/extraction/draft.rs
// description: narrative draft assembly from answered requirements
// reference: section-grouped proposal drafting

use crate::models::{
    AppendixMetric, Citation, DataFields, DraftMethod, DraftResult, DraftSection, RequirementRow,
    RequirementStatus, field_text,
};
use std::collections::HashMap;

pub const DRAFT_TITLE: &str = "Economic Development Response";
const MET_ROWS_PER_SECTION: usize = 3;
const APPENDIX_CAP: usize = 10;
const NEEDS_INFORMATION: &str = "Additional information needed for this section.";

pub struct DraftAssembler;

impl DraftAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Draft from answered rows, or `None` when no row has a known status.
    pub fn from_requirements(
        &self,
        requirements: &[RequirementRow],
        citations: Vec<Citation>,
        kb_context_used: bool,
    ) -> Option<DraftResult> {
        let answered: Vec<&RequirementRow> = requirements
            .iter()
            .filter(|r| r.status != RequirementStatus::Unknown)
            .collect();
        if answered.is_empty() {
            return None;
        }

        let mut order: Vec<&str> = Vec::new();
        let mut grouped: HashMap<&str, Vec<&RequirementRow>> = HashMap::new();
        for row in answered {
            let rows = grouped.entry(row.section.as_str()).or_default();
            if rows.is_empty() {
                order.push(row.section.as_str());
            }
            rows.push(row);
        }

        let mut sections = Vec::with_capacity(order.len());
        let mut appendix_metrics = Vec::new();

        for name in order {
            let met: Vec<&RequirementRow> = grouped[name]
                .iter()
                .copied()
                .filter(|r| r.status == RequirementStatus::Met)
                .collect();

            if met.is_empty() {
                sections.push(DraftSection::new(name, NEEDS_INFORMATION));
                continue;
            }

            let mut lines = vec![format!(
                "We can address {} requirements in this section:",
                met.len()
            )];
            for row in met.iter().take(MET_ROWS_PER_SECTION) {
                let Some(answer) = row.answer_value.as_deref() else {
                    continue;
                };
                lines.push(format!("- {}: {}", row.requirement_text, answer));

                if let Some(unit) = row.unit.as_deref() {
                    appendix_metrics.push(AppendixMetric {
                        metric: metric_name(row),
                        value: format!("{} {}", answer, unit).trim().to_string(),
                        source: row.source_field.clone().unwrap_or_default(),
                    });
                }
            }
            sections.push(DraftSection::new(name, lines.join("\n")));
        }

        appendix_metrics.truncate(APPENDIX_CAP);

        Some(DraftResult {
            title: DRAFT_TITLE.to_string(),
            sections,
            appendix_metrics,
            citations,
            method: DraftMethod::Llm,
            kb_context_used,
        })
    }

    /// Boilerplate draft built only from the data fields.
    pub fn deterministic(
        &self,
        fields: &DataFields,
        city: Option<&str>,
        industry: Option<&str>,
        citations: Vec<Citation>,
        kb_context_used: bool,
    ) -> DraftResult {
        let city_info = city
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!(" for {}", c))
            .unwrap_or_default();
        let industry_info = industry
            .filter(|i| !i.trim().is_empty())
            .map(|i| format!(" in the {} sector", i))
            .unwrap_or_default();

        let answered = fields
            .iter()
            .filter(|(_, v)| v.as_str() != Some("TODO"))
            .count();

        let executive_summary = format!(
            "We are pleased to submit this response to your RFP{}{}.\n\
Our team has delivered comparable projects and is positioned to meet your requirements.\n\
Based on our analysis, we can address {} of your key requirements immediately.",
            city_info, industry_info, answered
        );

        let tech_features: Vec<&str> = fields
            .iter()
            .filter(|(k, v)| k.starts_with("tech_") && v.as_str() != Some("TODO"))
            .map(|(k, _)| k.as_str())
            .collect();
        let technical = if tech_features.is_empty() {
            "We will develop a technical approach tailored to your specific requirements.".to_string()
        } else {
            format!(
                "Our technical approach builds on proven capabilities in {}. \
We can scale delivery to meet your needs.",
                tech_features.join(", ")
            )
        };

        let timeline = field_text(fields, "timeline").unwrap_or_else(|| "TBD".to_string());
        let budget =
            field_text(fields, "budget").unwrap_or_else(|| "competitive pricing".to_string());
        let management = format!(
            "Timeline: {}\nBudget: {}\nDelivery is tracked against milestones to stay on schedule and on budget.",
            timeline, budget
        );

        let qualifications = "Our team brings deep expertise and a record of successful implementations. \
We look forward to partnering with you.";

        DraftResult {
            title: DRAFT_TITLE.to_string(),
            sections: vec![
                DraftSection::new("Executive Summary", executive_summary),
                DraftSection::new("Technical Approach", technical),
                DraftSection::new("Project Management", management),
                DraftSection::new("Qualifications", qualifications),
            ],
            appendix_metrics: Vec::new(),
            citations,
            method: DraftMethod::Deterministic,
            kb_context_used,
        }
    }
}

impl Default for DraftAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn metric_name(row: &RequirementRow) -> String {
    match row.normalized_key.as_deref() {
        Some(key) => key
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        None => row.requirement_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Datatype, Priority, RequirementLogic, requirement_id};
    use pretty_assertions::assert_eq;

    fn row(
        n: usize,
        section: &str,
        status: RequirementStatus,
        answer: Option<&str>,
        unit: Option<&str>,
    ) -> RequirementRow {
        RequirementRow {
            id: requirement_id(n),
            section: section.to_string(),
            priority: Priority::Medium,
            requirement_text: format!("Requirement {}", n),
            normalized_key: Some(format!("metric_{}", n)),
            datatype: Datatype::Number,
            unit: unit.map(str::to_string),
            logic: RequirementLogic::default(),
            answer_value: answer.map(str::to_string),
            status,
            source_field: Some(format!("features.metric_{}", n)),
            source_attachment: None,
            confidence: 0.9,
            notes: None,
        }
    }

    #[test]
    fn test_groups_sections_in_first_seen_order() {
        let rows = vec![
            row(1, "Sites", RequirementStatus::Met, Some("220"), Some("acres")),
            row(2, "Workforce", RequirementStatus::NotMet, None, None),
            row(3, "Sites", RequirementStatus::Met, Some("8.1"), Some("¢/kWh")),
            row(4, "Incentives", RequirementStatus::Unknown, None, None),
        ];
        let draft = DraftAssembler::new()
            .from_requirements(&rows, Vec::new(), false)
            .unwrap();

        let headings: Vec<&str> = draft.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Sites", "Workforce"]);
        assert_eq!(
            draft.sections[0].content,
            "We can address 2 requirements in this section:\n- Requirement 1: 220\n- Requirement 3: 8.1"
        );
        assert_eq!(draft.sections[1].content, NEEDS_INFORMATION);
        assert_eq!(draft.appendix_metrics.len(), 2);
        assert_eq!(draft.appendix_metrics[0].metric, "Metric 1");
        assert_eq!(draft.appendix_metrics[0].value, "220 acres");
        assert_eq!(draft.appendix_metrics[0].source, "features.metric_1");
    }

    #[test]
    fn test_at_most_three_met_rows_listed() {
        let rows: Vec<RequirementRow> = (1..=5)
            .map(|n| row(n, "Sites", RequirementStatus::Met, Some("yes"), None))
            .collect();
        let draft = DraftAssembler::new()
            .from_requirements(&rows, Vec::new(), false)
            .unwrap();

        let content = &draft.sections[0].content;
        assert!(content.starts_with("We can address 5 requirements"));
        assert_eq!(content.lines().count(), 4);
        assert!(draft.appendix_metrics.is_empty());
    }

    #[test]
    fn test_appendix_capped() {
        let rows: Vec<RequirementRow> = (1..=15)
            .map(|n| {
                row(
                    n,
                    &format!("Section {}", n),
                    RequirementStatus::Met,
                    Some("1"),
                    Some("%"),
                )
            })
            .collect();
        let draft = DraftAssembler::new()
            .from_requirements(&rows, Vec::new(), false)
            .unwrap();
        assert_eq!(draft.appendix_metrics.len(), 10);
    }

    #[test]
    fn test_all_unknown_yields_none() {
        let rows = vec![row(1, "Sites", RequirementStatus::Unknown, None, None)];
        assert!(DraftAssembler::new().from_requirements(&rows, Vec::new(), false).is_none());
    }

    #[test]
    fn test_deterministic_sections() {
        let fields: DataFields = serde_json::from_str(
            r#"{"timeline": "90 days", "tech_software": true, "budget": "TODO"}"#,
        )
        .unwrap();
        let draft = DraftAssembler::new().deterministic(
            &fields,
            Some("Columbus"),
            Some("logistics"),
            Vec::new(),
            false,
        );

        let headings: Vec<&str> = draft.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec!["Executive Summary", "Technical Approach", "Project Management", "Qualifications"]
        );
        assert!(draft.sections[0].content.contains("for Columbus in the logistics sector"));
        assert!(draft.sections[0].content.contains("address 2 of your key requirements"));
        assert!(draft.sections[1].content.contains("tech_software"));
        assert!(draft.sections[2].content.starts_with("Timeline: 90 days\nBudget: TODO"));
        assert_eq!(draft.method, DraftMethod::Deterministic);
    }
}
