//! Safeguarding screen. Any hit here forces the risk assessment to at
//! least High and flags the case for safeguarding review.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority, SafeguardingConcern};
use super::super::extraction::labels;
use super::scan;

struct ConcernPattern {
    category: &'static str,
    markers: &'static [&'static str],
    severe: bool,
}

const CONCERNS: &[ConcernPattern] = &[
    ConcernPattern {
        category: "Disclosure",
        markers: &["disclosed", "disclosure"],
        severe: true,
    },
    ConcernPattern {
        category: "Physical harm",
        markers: &["physical harm", "bruising", "unexplained injury", "injuries"],
        severe: true,
    },
    ConcernPattern {
        category: "Emotional harm",
        markers: &["self-harm", "self harm", "suicidal", "emotional abuse"],
        severe: true,
    },
    ConcernPattern {
        category: "Neglect",
        markers: &["neglect", "unwashed", "arrives hungry", "unkempt"],
        severe: false,
    },
    ConcernPattern {
        category: "Absence from education",
        markers: &["missing from education", "not on roll", "whereabouts unknown"],
        severe: false,
    },
    ConcernPattern {
        category: "Domestic circumstances",
        markers: &["domestic abuse", "domestic violence", "police were called"],
        severe: false,
    },
    ConcernPattern {
        category: labels::SAFEGUARDING_REFERRAL,
        markers: &[
            "section 47",
            "section 17",
            "child protection",
            "child in need",
            "referral to social care",
            "mash referral",
        ],
        severe: false,
    },
];

pub struct SafeguardingAnalyzer;

#[async_trait]
impl DocumentAnalyzer for SafeguardingAnalyzer {
    fn name(&self) -> &'static str {
        "safeguarding_screen"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let sentences = scan::sentences(body);

        let mut concerns = Vec::new();
        let mut insights = Vec::new();
        for pattern in CONCERNS {
            let hit = sentences.iter().find_map(|sentence| {
                let lower = sentence.to_lowercase();
                pattern
                    .markers
                    .iter()
                    .find(|marker| lower.contains(*marker))
                    .map(|marker| (scan::excerpt(sentence, 160), *marker))
            });
            let Some((evidence, marker)) = hit else {
                continue;
            };
            concerns.push(SafeguardingConcern {
                category: pattern.category.to_string(),
                detail: format!("Document references \"{marker}\""),
                evidence: evidence.clone(),
            });
            insights.push(Insight {
                kind: InsightKind::Safeguarding,
                confidence: 0.85,
                statement: format!("Safeguarding signal: {}", pattern.category),
                evidence,
                priority: if pattern.severe {
                    Priority::Critical
                } else {
                    Priority::High
                },
                action_required: true,
                suggested_action: Some(
                    "Refer to the local safeguarding partnership and record the outcome"
                        .to_string(),
                ),
                cost_implication: None,
            });
        }

        // A caseworker-recorded concern with no echo in the document is
        // itself worth surfacing.
        let caseworker_flagged = context
            .concerns
            .iter()
            .any(|concern| concern.to_lowercase().contains("safeguarding"));
        if caseworker_flagged && concerns.is_empty() {
            insights.push(Insight {
                kind: InsightKind::Safeguarding,
                confidence: 0.6,
                statement: "Caseworker recorded a safeguarding concern the document does not evidence"
                    .to_string(),
                evidence: String::new(),
                priority: Priority::Medium,
                action_required: true,
                suggested_action: Some(
                    "Cross-check the concern against the case file and update the record"
                        .to_string(),
                ),
                cost_implication: None,
            });
        }

        Ok(PartialFindings {
            insights,
            safeguarding: concerns,
            ..PartialFindings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            document_ref: "doc-500".to_string(),
            title: "Pastoral log".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn disclosure_is_critical() {
        let body = "The child disclosed an incident at home to the class teacher.";
        let findings = SafeguardingAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.safeguarding.len(), 1);
        assert_eq!(findings.safeguarding[0].category, "Disclosure");
        assert_eq!(findings.insights[0].priority, Priority::Critical);
        assert!(findings.insights[0].action_required);
    }

    #[tokio::test]
    async fn referral_language_is_high_priority() {
        let body = "A referral to social care was made following the meeting.";
        let findings = SafeguardingAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn unevidenced_caseworker_concern_is_noted() {
        let context = CaseContext {
            case_id: "case-9".to_string(),
            concerns: vec!["Safeguarding concern raised by school".to_string()],
            ..CaseContext::default()
        };
        let body = "Attendance is stable and provision is in place.";
        let findings = SafeguardingAnalyzer
            .analyze(&document(body), &context)
            .await
            .expect("analyzer succeeds");
        assert!(findings.safeguarding.is_empty());
        assert_eq!(findings.insights.len(), 1);
        assert_eq!(findings.insights[0].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn clean_document_stays_quiet() {
        let findings = SafeguardingAnalyzer
            .analyze(
                &document("Progress against outcomes is good this term."),
                &CaseContext::default(),
            )
            .await
            .expect("analyzer succeeds");
        assert!(findings.safeguarding.is_empty());
        assert!(findings.insights.is_empty());
    }
}
