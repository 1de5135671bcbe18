// file: tests/analysis.rs
// description: analyze and draft flows through the pipeline facade

mod common;

use common::{ScriptedLlm, pipeline, response_json, row_json, sectioned_rfp};
use rfp_rag::extraction::ExtractionMode;
use rfp_rag::models::{
    AnalysisMethod, DataFields, DraftMethod, IngestMetadata, RequirementStatus,
};
use rfp_rag::services::LlmAdapter;
use std::sync::Arc;

const SHORT_RFP: &str = "The City of Columbus seeks a site selection partner. \
Project budget: $2,500,000. Proposals are due within 45 days. Preferred location: Columbus, OH. \
The facility must provide 150,000 square feet and a workforce of 250 employees. \
Respondents should describe tax incentive programs and the software system used for reporting.";

const KB_PASSAGE: &str = "Columbus offers a job creation tax credit and property tax abatement \
for companies that locate distribution and manufacturing operations in the region. The city \
economic development office coordinates incentive applications with the state and helps employers \
recruit workforce through regional training programs. Enterprise zone benefits are available on \
most industrial sites, and tax increment financing supports road and utility improvements for new \
projects with significant capital investment and job commitments.";

fn fields(json: &str) -> DataFields {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn test_unavailable_llm_falls_back_to_patterns() {
    let llm = Arc::new(ScriptedLlm::unavailable());
    let (pipeline, _) = pipeline(Some(llm.clone() as Arc<dyn LlmAdapter>));

    let result = pipeline
        .analyze(SHORT_RFP, &fields(r#"{"budget": "$2.4M"}"#))
        .await
        .unwrap();

    assert_eq!(result.method, AnalysisMethod::Regex);
    assert!(!result.requirements.is_empty());
    assert_eq!(llm.calls(), 2);

    let budget = result
        .requirements
        .iter()
        .find(|r| r.normalized_key.as_deref() == Some("budget"))
        .unwrap();
    assert_eq!(budget.status, RequirementStatus::Met);
    assert_eq!(budget.answer_value.as_deref(), Some("$2.4M"));
}

#[tokio::test]
async fn test_no_llm_and_no_matches_still_returns_result() {
    let (pipeline, _) = pipeline(None);
    let result = pipeline
        .analyze("Nothing recognizable here at all.", &DataFields::new())
        .await
        .unwrap();

    assert_eq!(result.method, AnalysisMethod::Regex);
    assert!(result.requirements.is_empty());
    assert_eq!(result.summary.met + result.summary.not_met + result.summary.unknown, 0);
}

#[tokio::test]
async fn test_malformed_reply_is_retried_once() {
    let llm = Arc::new(ScriptedLlm::new(|_, call| {
        if call == 0 {
            Ok("I think the requirements are...".to_string())
        } else {
            Ok(response_json(&[row_json(7, "Sites", "Met", Some("220"))]))
        }
    }));
    let (pipeline, _) = pipeline(Some(llm.clone() as Arc<dyn LlmAdapter>));

    let outcome = pipeline
        .analyze_detailed(SHORT_RFP, &DataFields::new())
        .await
        .unwrap();

    assert_eq!(outcome.mode, ExtractionMode::SingleShot);
    assert_eq!(outcome.result.method, AnalysisMethod::Llm);
    assert_eq!(outcome.result.requirements[0].id, "REQ-001");
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_ids_increase_across_sections() {
    let llm = Arc::new(ScriptedLlm::new(|_, call| {
        let rows: Vec<String> = (1..=call + 1)
            .map(|n| row_json(n, "Section", "Unknown", None))
            .collect();
        Ok(response_json(&rows))
    }));
    let (pipeline, _) = pipeline(Some(llm.clone() as Arc<dyn LlmAdapter>));
    let rfp = sectioned_rfp(
        &["Project Overview", "Scope of Services", "Evaluation Criteria"],
        3000,
    );

    let result = pipeline.analyze(&rfp, &DataFields::new()).await.unwrap();

    let numbers: Vec<usize> = result
        .requirements
        .iter()
        .filter_map(|r| r.id.strip_prefix("REQ-")?.parse().ok())
        .collect();
    assert_eq!(numbers, (1..=6).collect::<Vec<_>>());

    // each section prompt starts numbering where the previous one stopped
    let prompts = llm.prompts();
    assert!(prompts[0].contains("Start requirement ids at REQ-001"));
    assert!(prompts[1].contains("Start requirement ids at REQ-002"));
    assert!(prompts[2].contains("Start requirement ids at REQ-004"));
}

#[tokio::test]
async fn test_analysis_prompt_carries_knowledge_base_context() {
    let llm = Arc::new(ScriptedLlm::new(|_, _| {
        Ok(response_json(&[row_json(1, "Incentives", "Met", Some("yes"))]))
    }));
    let (pipeline, _) = pipeline(Some(llm.clone() as Arc<dyn LlmAdapter>));
    pipeline
        .ingest(KB_PASSAGE, IngestMetadata::titled("Columbus Incentive Guide"))
        .await
        .unwrap();

    pipeline.analyze(SHORT_RFP, &DataFields::new()).await.unwrap();

    let prompts = llm.prompts();
    assert!(prompts[0].contains("Source: Columbus Incentive Guide"));
}

#[tokio::test]
async fn test_draft_from_llm_rows_cites_knowledge_base() {
    let llm = Arc::new(ScriptedLlm::new(|_, _| {
        Ok(response_json(&[
            row_json(1, "Sites", "Met", Some("220")),
            row_json(2, "Sites", "Met", Some("8.1")),
            row_json(3, "Workforce", "Not Met", None),
        ]))
    }));
    let (pipeline, _) = pipeline(Some(llm as Arc<dyn LlmAdapter>));
    pipeline
        .ingest(
            KB_PASSAGE,
            IngestMetadata {
                jurisdiction: Some("Columbus, OH".to_string()),
                ..IngestMetadata::titled("Columbus Incentive Guide")
            },
        )
        .await
        .unwrap();

    let draft = pipeline
        .draft(SHORT_RFP, &DataFields::new(), Some("Columbus"), None)
        .await
        .unwrap();

    assert_eq!(draft.method, DraftMethod::Llm);
    assert!(draft.kb_context_used);
    assert_eq!(draft.citations.len(), 1);
    assert_eq!(draft.citations[0].title, "Columbus Incentive Guide");

    let headings: Vec<&str> = draft.sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, vec!["Sites", "Workforce"]);
    assert_eq!(draft.appendix_metrics.len(), 2);
    assert_eq!(draft.appendix_metrics[0].value, "220 acres");
}

#[tokio::test]
async fn test_draft_without_llm_is_deterministic() {
    let (pipeline, _) = pipeline(None);

    let draft = pipeline
        .draft(
            SHORT_RFP,
            &fields(r#"{"timeline": "45 days"}"#),
            Some("Columbus"),
            Some("logistics"),
        )
        .await
        .unwrap();

    assert_eq!(draft.method, DraftMethod::Deterministic);
    assert!(!draft.kb_context_used);
    assert!(draft.citations.is_empty());
    assert_eq!(draft.sections.len(), 4);
    assert!(draft.sections[2].content.starts_with("Timeline: 45 days"));
}
