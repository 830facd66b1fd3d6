//! Holistic review pass for full assessment reads. Anchors all recency
//! checks on the latest date found in the document itself, so re-running
//! the analysis months later gives the same verdicts.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::scan;

const ANNUAL_REVIEW_INTERVAL_DAYS: i64 = 365;

const PROGRESS_MARKERS: &[&str] = &["progress against outcomes", "progress towards", "progress"];

const ADULTHOOD_MARKERS: &[&str] = &[
    "preparation for adulthood",
    "post-16",
    "post 16",
    "transition to adulthood",
];

pub struct AssessmentReviewAnalyzer;

impl AssessmentReviewAnalyzer {
    /// The document's own "today": the latest date it mentions, falling
    /// back to the recorded-on date.
    fn anchor_date(document: &CaseDocument, body: &str) -> Option<NaiveDate> {
        let mut latest = document.recorded_on;
        for sentence in scan::sentences(body) {
            for date in scan::dates_in(sentence) {
                if latest.map_or(true, |current| date > current) {
                    latest = Some(date);
                }
            }
        }
        latest
    }

    fn annual_review_date(body: &str) -> Option<NaiveDate> {
        scan::sentences(body).into_iter().find_map(|sentence| {
            let lower = sentence.to_lowercase();
            if lower.contains("annual review") {
                scan::first_date_in(sentence)
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for AssessmentReviewAnalyzer {
    fn name(&self) -> &'static str {
        "assessment_review"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let lower = body.to_lowercase();
        let mut insights = Vec::new();

        if let (Some(anchor), Some(review)) =
            (Self::anchor_date(document, body), Self::annual_review_date(body))
        {
            let elapsed = (anchor - review).num_days();
            if elapsed > ANNUAL_REVIEW_INTERVAL_DAYS {
                insights.push(Insight {
                    kind: InsightKind::Concern,
                    confidence: 0.85,
                    statement: format!("Annual review is overdue: last held {review}"),
                    evidence: format!("{elapsed} days elapsed by the latest entry in the record"),
                    priority: Priority::High,
                    action_required: true,
                    suggested_action: Some("Schedule the annual review".to_string()),
                    cost_implication: None,
                });
            } else {
                insights.push(Insight {
                    kind: InsightKind::Timeline,
                    confidence: 0.8,
                    statement: format!("Annual review held on {review}"),
                    evidence: String::new(),
                    priority: Priority::Low,
                    action_required: false,
                    suggested_action: None,
                    cost_implication: None,
                });
            }
        }

        if !context.prior_assessment_refs.is_empty() {
            let referenced = context
                .prior_assessment_refs
                .iter()
                .any(|reference| lower.contains(&reference.to_lowercase()));
            if !referenced {
                insights.push(Insight {
                    kind: InsightKind::Concern,
                    confidence: 0.7,
                    statement: "Prior assessments on file are not referenced in this review"
                        .to_string(),
                    evidence: String::new(),
                    priority: Priority::Medium,
                    action_required: true,
                    suggested_action: Some(
                        "Cross-reference the earlier assessments when finalising".to_string(),
                    ),
                    cost_implication: None,
                });
            }
        }

        for provision in context.current_provision.iter().take(3) {
            if !lower.contains(&provision.to_lowercase()) {
                insights.push(Insight {
                    kind: InsightKind::Concern,
                    confidence: 0.7,
                    statement: format!("Current provision \"{provision}\" is not reviewed"),
                    evidence: String::new(),
                    priority: Priority::Medium,
                    action_required: true,
                    suggested_action: Some(
                        "Confirm whether the provision is still delivered and effective"
                            .to_string(),
                    ),
                    cost_implication: None,
                });
            }
        }

        if scan::first_phrase_in(&lower, PROGRESS_MARKERS).is_none() {
            insights.push(Insight {
                kind: InsightKind::Concern,
                confidence: 0.8,
                statement: "No progress-against-outcomes narrative in the review".to_string(),
                evidence: String::new(),
                priority: Priority::High,
                action_required: true,
                suggested_action: Some(
                    "Record progress against each outcome in the plan".to_string(),
                ),
                cost_implication: None,
            });
        }

        if let Some(age) = context.child_age {
            if age >= 16 && scan::first_phrase_in(&lower, ADULTHOOD_MARKERS).is_none() {
                insights.push(Insight {
                    kind: InsightKind::Concern,
                    confidence: 0.85,
                    statement: format!(
                        "Preparation for adulthood is not addressed for a {age}-year-old"
                    ),
                    evidence: String::new(),
                    priority: Priority::High,
                    action_required: true,
                    suggested_action: Some(
                        "Add preparation-for-adulthood outcomes and provision".to_string(),
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
