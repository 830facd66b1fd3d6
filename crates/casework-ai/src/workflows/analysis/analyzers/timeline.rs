//! Chronology mapping: orders every dated sentence, measures gaps, and
//! checks the 20-week assessment window when both endpoints are present.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::scan;

/// Days allowed between an assessment request and the final plan: the
/// statutory 20 weeks.
const STATUTORY_WINDOW_DAYS: i64 = 140;

/// A run of silence longer than this between dated entries is reported.
const GAP_THRESHOLD_DAYS: i64 = 90;

pub struct TimelineAnalyzer;

impl TimelineAnalyzer {
    fn dated_entries(body: &str) -> Vec<(NaiveDate, String)> {
        let mut entries: Vec<(NaiveDate, String)> = Vec::new();
        for sentence in scan::sentences(body) {
            for date in scan::dates_in(sentence) {
                entries.push((date, scan::excerpt(sentence, 140)));
            }
        }
        entries.sort_by_key(|(date, _)| *date);
        entries
    }

    fn statutory_window(body: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut requested = None;
        let mut finalised = None;
        for sentence in scan::sentences(body) {
            let lower = sentence.to_lowercase();
            let date = scan::first_date_in(sentence);
            if requested.is_none()
                && date.is_some()
                && lower.contains("request")
                && lower.contains("assessment")
            {
                requested = date;
            }
            if finalised.is_none()
                && date.is_some()
                && lower.contains("final")
                && lower.contains("plan")
            {
                finalised = date;
            }
        }
        requested.zip(finalised)
    }
}

#[async_trait]
impl DocumentAnalyzer for TimelineAnalyzer {
    fn name(&self) -> &'static str {
        "timeline_mapper"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let entries = Self::dated_entries(body);
        let mut insights = Vec::new();

        match (entries.first(), entries.last()) {
            (Some((first, first_excerpt)), Some((last, _))) => {
                insights.push(Insight {
                    kind: InsightKind::Timeline,
                    confidence: 0.85,
                    statement: format!(
                        "Document covers {} dated events between {} and {}",
                        entries.len(),
                        first,
                        last
                    ),
                    evidence: first_excerpt.clone(),
                    priority: Priority::Low,
                    action_required: false,
                    suggested_action: None,
                    cost_implication: None,
                });
            }
            _ => {
                insights.push(Insight {
                    kind: InsightKind::Timeline,
                    confidence: 0.7,
                    statement: "No dated events found; the chronology cannot be verified"
                        .to_string(),
                    evidence: String::new(),
                    priority: Priority::Medium,
                    action_required: true,
                    suggested_action: Some(
                        "Ask the author to date the key events in the record".to_string(),
                    ),
                    cost_implication: None,
                });
            }
        }

        let widest_gap = entries
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0).num_days())
            .max()
            .unwrap_or(0);
        if widest_gap > GAP_THRESHOLD_DAYS {
            insights.push(Insight {
                kind: InsightKind::Timeline,
                confidence: 0.8,
                statement: format!("Longest gap between dated entries is {widest_gap} days"),
                evidence: String::new(),
                priority: Priority::Medium,
                action_required: false,
                suggested_action: None,
                cost_implication: None,
            });
        }

        if let Some((requested, finalised)) = Self::statutory_window(body) {
            let elapsed = (finalised - requested).num_days();
            if elapsed > STATUTORY_WINDOW_DAYS {
                insights.push(Insight {
                    kind: InsightKind::Timeline,
                    confidence: 0.9,
                    statement: format!(
                        "Assessment ran {elapsed} days from request to final plan, beyond the 20-week window"
                    ),
                    evidence: format!("requested {requested}, final plan {finalised}"),
                    priority: Priority::High,
                    action_required: true,
                    suggested_action: Some(
                        "Record the reason for the overrun and notify the family".to_string(),
                    ),
                    cost_implication: None,
                });
            }
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
            document_ref: "doc-600".to_string(),
            title: "Case chronology".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn orders_dated_events_and_reports_span() {
        let body = "Advice received on 2026-02-10. The request for assessment was made on 2025-11-03.";
        let findings = TimelineAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let span = &findings.insights[0];
        assert!(span.statement.contains("2 dated events"));
        assert!(span.statement.contains("2025-11-03"));
        assert!(span.statement.contains("2026-02-10"));
    }

    #[tokio::test]
    async fn undated_document_asks_for_dates() {
        let findings = TimelineAnalyzer
            .analyze(
                &document("The review considered progress and provision."),
                &CaseContext::default(),
            )
            .await
            .expect("analyzer succeeds");
        assert!(findings.insights[0].action_required);
        assert_eq!(findings.insights[0].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn statutory_overrun_is_flagged() {
        let body = "The request for an EHC needs assessment was received on 2025-09-01. \
                    The final plan was issued on 2026-03-01.";
        let findings = TimelineAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let overrun = findings
            .insights
            .iter()
            .find(|insight| insight.statement.contains("20-week"))
            .expect("overrun flagged");
        assert_eq!(overrun.priority, Priority::High);
        assert!(overrun.statement.contains("181 days"));
    }

    #[tokio::test]
    async fn window_within_limit_is_not_flagged() {
        let body = "The request for assessment was received on 2026-01-05. \
                    The final plan was issued on 2026-04-01.";
        let findings = TimelineAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert!(!findings
            .insights
            .iter()
            .any(|insight| insight.statement.contains("20-week")));
    }
}
