//! Statutory-language screen. Surfaces compliance-flavoured narrative
//! signals as insights; the binding verdicts are produced later by the
//! rule set over the merged extraction record.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::scan;

const PRESSURE_MARKERS: &[&str] = &[
    "out of time",
    "exceeded the 20-week",
    "beyond the statutory",
    "overdue",
    "not yet issued",
    "missed deadline",
    "missed the deadline",
    "awaiting advice",
    "delay",
];

const ON_TRACK_MARKERS: &[&str] = &[
    "within the 20-week",
    "within statutory timescales",
    "on schedule",
    "issued on time",
];

const ESCALATION_MARKERS: &[&str] = &["tribunal", "mediation", "appeal"];

const VAGUE_PROVISION_MARKERS: &[&str] = &[
    "provision is not specified",
    "not quantified",
    "unquantified",
    "lacks detail",
    "to be confirmed",
];

pub struct StatutorySignalAnalyzer;

impl StatutorySignalAnalyzer {
    fn first_match<'m>(body: &str, markers: &[&'m str]) -> Option<(String, &'m str)> {
        for sentence in scan::sentences(body) {
            let lower = sentence.to_lowercase();
            if let Some(marker) = markers
                .iter()
                .copied()
                .find(|marker| lower.contains(marker))
            {
                return Some((scan::excerpt(sentence, 160), marker));
            }
        }
        None
    }
}

#[async_trait]
impl DocumentAnalyzer for StatutorySignalAnalyzer {
    fn name(&self) -> &'static str {
        "statutory_signals"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let mut insights = Vec::new();

        if let Some((evidence, marker)) = Self::first_match(body, PRESSURE_MARKERS) {
            insights.push(Insight {
                kind: InsightKind::Compliance,
                confidence: 0.8,
                statement: format!("Statutory timescale pressure noted (\"{marker}\")"),
                evidence,
                priority: Priority::High,
                action_required: true,
                suggested_action: Some(
                    "Confirm the statutory clock position and notify the family of any delay"
                        .to_string(),
                ),
                cost_implication: None,
            });
        } else if let Some((evidence, _)) = Self::first_match(body, ON_TRACK_MARKERS) {
            insights.push(Insight {
                kind: InsightKind::Compliance,
                confidence: 0.75,
                statement: "Document reports the process as within statutory timescales"
                    .to_string(),
                evidence,
                priority: Priority::Low,
                action_required: false,
                suggested_action: None,
                cost_implication: None,
            });
        }

        if let Some((evidence, marker)) = Self::first_match(body, ESCALATION_MARKERS) {
            insights.push(Insight {
                kind: InsightKind::Compliance,
                confidence: 0.85,
                statement: format!("Formal escalation referenced (\"{marker}\")"),
                evidence,
                priority: Priority::High,
                action_required: true,
                suggested_action: Some(
                    "Brief the decision-making panel and review the disputed sections".to_string(),
                ),
                cost_implication: None,
            });
        }

        if let Some((evidence, _)) = Self::first_match(body, VAGUE_PROVISION_MARKERS) {
            insights.push(Insight {
                kind: InsightKind::Compliance,
                confidence: 0.8,
                statement: "Provision is described without specification or quantification"
                    .to_string(),
                evidence,
                priority: Priority::Medium,
                action_required: true,
                suggested_action: Some(
                    "Specify and quantify the provision so delivery can be verified".to_string(),
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
            document_ref: "doc-200".to_string(),
            title: "Caseworker note".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn flags_timescale_pressure_over_on_track_language() {
        let body = "The plan is overdue. The family were told it was on schedule in January.";
        let findings = StatutorySignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
        let insight = &findings.insights[0];
        assert_eq!(insight.kind, InsightKind::Compliance);
        assert_eq!(insight.priority, Priority::High);
        assert!(insight.action_required);
    }

    #[tokio::test]
    async fn on_track_language_yields_low_priority_note() {
        let body = "Advice gathering is within statutory timescales and nothing is outstanding.";
        let findings = StatutorySignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
        assert_eq!(findings.insights[0].priority, Priority::Low);
        assert!(!findings.insights[0].action_required);
    }

    #[tokio::test]
    async fn tribunal_reference_is_escalated() {
        let body = "The family have lodged a tribunal appeal regarding section F.";
        let findings = StatutorySignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert!(findings
            .insights
            .iter()
            .any(|insight| insight.statement.contains("escalation")));
    }
}
