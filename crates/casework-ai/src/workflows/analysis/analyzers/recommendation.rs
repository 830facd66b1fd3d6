//! Recommendation mining: lifts advisory sentences into structured
//! insights with an urgency band inferred from the wording.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::super::extraction::normalize_key;
use super::scan;

const RECOMMENDATION_MARKERS: &[&str] = &[
    "recommend",
    "it is advised",
    "advise that",
    "proposed that",
    "should be provided",
    "should receive",
    "would benefit from",
];

const URGENT_MARKERS: &[&str] = &[
    "immediately",
    "urgent",
    "without delay",
    "as a matter of urgency",
];

const PROMPT_MARKERS: &[&str] = &[
    "this term",
    "within 2 weeks",
    "within two weeks",
    "within 4 weeks",
    "within four weeks",
    "at the earliest opportunity",
    "promptly",
];

const LONG_TERM_MARKERS: &[&str] = &[
    "over time",
    "longer term",
    "long-term",
    "in due course",
    "at the next annual review",
];

/// Upper bound on mined recommendations so a list-heavy report cannot
/// flood the result.
const MAX_RECOMMENDATIONS: usize = 8;

fn priority_for(lower: &str) -> Priority {
    if URGENT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Priority::Critical
    } else if PROMPT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Priority::High
    } else if LONG_TERM_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

pub struct RecommendationAnalyzer;

#[async_trait]
impl DocumentAnalyzer for RecommendationAnalyzer {
    fn name(&self) -> &'static str {
        "recommendation_extraction"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let mut insights = Vec::new();
        let mut seen = Vec::new();

        for sentence in scan::sentences(body) {
            if insights.len() >= MAX_RECOMMENDATIONS {
                break;
            }
            let lower = sentence.to_lowercase();
            if !RECOMMENDATION_MARKERS
                .iter()
                .any(|marker| lower.contains(marker))
            {
                continue;
            }
            let key = normalize_key(sentence);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let priority = priority_for(&lower);
            let statement = scan::excerpt(sentence, 180);
            let confidence = if lower.contains("recommend") { 0.9 } else { 0.7 };
            let cost_implication = scan::scan_amounts(sentence)
                .first()
                .map(|hit| hit.raw.clone());
            let action_required = priority >= Priority::High
                || lower.contains("must")
                || lower.contains("required");

            insights.push(Insight {
                kind: InsightKind::Recommendation,
                confidence,
                statement: statement.clone(),
                evidence: scan::excerpt(sentence, 160),
                priority,
                action_required,
                suggested_action: Some(statement),
                cost_implication,
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
            document_ref: "doc-300".to_string(),
            title: "Educational psychology advice".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn urgency_wording_sets_priority() {
        let body = "It is recommended that sensory breaks are introduced immediately. \
                    The school should receive training at the next annual review.";
        let findings = RecommendationAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 2);
        assert_eq!(findings.insights[0].priority, Priority::Critical);
        assert!(findings.insights[0].action_required);
        assert_eq!(findings.insights[1].priority, Priority::Low);
    }

    #[tokio::test]
    async fn repeated_recommendations_are_collapsed() {
        let body = "We recommend weekly speech therapy. We recommend weekly speech therapy.";
        let findings = RecommendationAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
    }

    #[tokio::test]
    async fn costed_recommendation_carries_the_amount() {
        let body = "It is recommended that a 1:1 teaching assistant (£18,000 per annum) is funded.";
        let findings = RecommendationAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(
            findings.insights[0].cost_implication.as_deref(),
            Some("£18,000")
        );
    }
}
