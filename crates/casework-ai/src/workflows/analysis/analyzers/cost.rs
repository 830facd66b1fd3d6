//! Cost breakdown over sterling amounts found in the document, with a
//! funding-status screen for costed provision that is not yet agreed.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::scan;

/// Totals at or above this level are treated as panel-worthy spend.
const HIGH_SPEND_THRESHOLD: f64 = 10_000.0;

const UNFUNDED_MARKERS: &[&str] = &[
    "not funded",
    "funding not agreed",
    "awaiting funding",
    "funding shortfall",
    "unfunded",
];

pub struct CostAnalyzer;

#[async_trait]
impl DocumentAnalyzer for CostAnalyzer {
    fn name(&self) -> &'static str {
        "cost_breakdown"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let hits = scan::scan_amounts(body);
        let mut insights = Vec::new();

        if hits.is_empty() {
            insights.push(Insight {
                kind: InsightKind::Financial,
                confidence: 0.7,
                statement: "No cost information identified in the document".to_string(),
                evidence: String::new(),
                priority: Priority::Low,
                action_required: false,
                suggested_action: None,
                cost_implication: None,
            });
        } else {
            let total: f64 = hits.iter().map(|hit| hit.pounds).sum();
            let largest = hits
                .iter()
                .max_by(|a, b| a.pounds.total_cmp(&b.pounds))
                .cloned();
            let high_spend = total >= HIGH_SPEND_THRESHOLD;

            insights.push(Insight {
                kind: InsightKind::Financial,
                confidence: 0.9,
                statement: format!(
                    "Identified {} costed item(s) totalling £{:.2}",
                    hits.len(),
                    total
                ),
                evidence: largest
                    .as_ref()
                    .map(|hit| hit.line.clone())
                    .unwrap_or_default(),
                priority: if high_spend {
                    Priority::High
                } else {
                    Priority::Medium
                },
                action_required: high_spend,
                suggested_action: high_spend
                    .then(|| "Route the costed package through the funding panel".to_string()),
                cost_implication: Some(format!("£{total:.2}")),
            });

            if let Some(largest) = largest {
                if hits.len() > 1 {
                    insights.push(Insight {
                        kind: InsightKind::Financial,
                        confidence: 0.85,
                        statement: format!("Largest single cost is {}", largest.raw),
                        evidence: largest.line.clone(),
                        priority: Priority::Medium,
                        action_required: false,
                        suggested_action: None,
                        cost_implication: Some(largest.raw.clone()),
                    });
                }
            }
        }

        let lower = body.to_lowercase();
        if let Some(marker) = scan::first_phrase_in(&lower, UNFUNDED_MARKERS) {
            let evidence = scan::sentences(body)
                .into_iter()
                .find(|sentence| sentence.to_lowercase().contains(marker))
                .map(|sentence| scan::excerpt(sentence, 160))
                .unwrap_or_default();
            insights.push(Insight {
                kind: InsightKind::Concern,
                confidence: 0.8,
                statement: "Costed provision is referenced without agreed funding".to_string(),
                evidence,
                priority: Priority::High,
                action_required: true,
                suggested_action: Some(
                    "Confirm the funding position before the provision start date".to_string(),
                ),
                cost_implication: None,
            });
        }

        Ok(PartialFindings {
            insights,
            ..PartialFindings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            document_ref: "doc-700".to_string(),
            title: "Costed provision plan".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn totals_and_flags_high_spend() {
        let body = "1:1 support costs £18,000 per annum.\nSpeech therapy costs £3,500 per annum.";
        let findings = CostAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let summary = &findings.insights[0];
        assert!(summary.statement.contains("£21500.00"));
        assert_eq!(summary.priority, Priority::High);
        assert!(summary.action_required);

        let largest = &findings.insights[1];
        assert!(largest.statement.contains("£18,000"));
    }

    #[tokio::test]
    async fn small_totals_stay_medium() {
        let body = "Travel support of £120.50 was agreed.";
        let findings = CostAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
        assert_eq!(findings.insights[0].priority, Priority::Medium);
        assert!(!findings.insights[0].action_required);
    }

    #[tokio::test]
    async fn missing_costs_reported_quietly() {
        let findings = CostAnalyzer
            .analyze(
                &document("The package is described without figures."),
                &CaseContext::default(),
            )
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
        assert_eq!(findings.insights[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn unfunded_language_raises_concern() {
        let body = "The £4,000 sensory programme is awaiting funding approval.";
        let findings = CostAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert!(findings
            .insights
            .iter()
            .any(|insight| insight.kind == InsightKind::Concern && insight.action_required));
    }
}
