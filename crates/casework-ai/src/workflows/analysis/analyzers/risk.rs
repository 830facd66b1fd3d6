//! Risk screening: maps known hazard language onto weighted risk factors
//! and surfaces the dominant factor as a concern insight.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority, RiskFactor, RiskLevel};
use super::scan;

struct HazardPattern {
    markers: &'static [&'static str],
    name: &'static str,
    likelihood: f32,
    impact: f32,
    mitigation: &'static str,
}

const HAZARDS: &[HazardPattern] = &[
    HazardPattern {
        markers: &["risk of exclusion", "excluded", "exclusion"],
        name: "Placement breakdown or exclusion",
        likelihood: 0.7,
        impact: 0.8,
        mitigation: "Convene an emergency annual review to stabilise the placement",
    },
    HazardPattern {
        markers: &["provision has not been delivered", "not receiving", "unmet need", "unmet"],
        name: "Provision not delivered as specified",
        likelihood: 0.75,
        impact: 0.7,
        mitigation: "Commission the specified provision and confirm start dates in writing",
    },
    HazardPattern {
        markers: &["regression", "falling further behind", "no progress"],
        name: "Developmental regression",
        likelihood: 0.6,
        impact: 0.75,
        mitigation: "Reassess needs and adjust outcomes with the allocated professionals",
    },
    HazardPattern {
        markers: &["attendance has fallen", "poor attendance", "attendance below"],
        name: "Poor school attendance",
        likelihood: 0.65,
        impact: 0.6,
        mitigation: "Agree an attendance support plan with the family and setting",
    },
    HazardPattern {
        markers: &["without a placement", "no school place", "awaiting placement"],
        name: "Child without a placement",
        likelihood: 0.6,
        impact: 0.9,
        mitigation: "Escalate placement sourcing to the panel with interim tuition in place",
    },
    HazardPattern {
        markers: &["tribunal", "appeal lodged"],
        name: "Tribunal escalation",
        likelihood: 0.5,
        impact: 0.7,
        mitigation: "Review the disputed sections and seek early resolution",
    },
    HazardPattern {
        markers: &["funding shortfall", "funding not agreed", "funding dispute"],
        name: "Funding shortfall",
        likelihood: 0.55,
        impact: 0.65,
        mitigation: "Take the costed provision back through the funding panel",
    },
];

fn priority_for(level: RiskLevel) -> Priority {
    match level {
        RiskLevel::Low => Priority::Low,
        RiskLevel::Medium => Priority::Medium,
        RiskLevel::High => Priority::High,
        RiskLevel::Critical => Priority::Critical,
    }
}

pub struct RiskSignalAnalyzer;

#[async_trait]
impl DocumentAnalyzer for RiskSignalAnalyzer {
    fn name(&self) -> &'static str {
        "risk_signals"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let lower = body.to_lowercase();

        let mut matched: Vec<(RiskFactor, String)> = Vec::new();
        for hazard in HAZARDS {
            let Some(marker) = scan::first_phrase_in(&lower, hazard.markers) else {
                continue;
            };
            let evidence = scan::sentences(body)
                .into_iter()
                .find(|sentence| sentence.to_lowercase().contains(marker))
                .map(|sentence| scan::excerpt(sentence, 160))
                .unwrap_or_default();
            let factor = RiskFactor {
                name: hazard.name.to_string(),
                likelihood: hazard.likelihood,
                impact: hazard.impact,
                mitigation: hazard.mitigation.to_string(),
            };
            matched.push((factor, evidence));
        }

        let mut insights = Vec::new();
        if let Some((top, evidence)) = matched
            .iter()
            .max_by(|a, b| a.0.score().total_cmp(&b.0.score()))
        {
            let level = RiskLevel::from_score(top.score());
            insights.push(Insight {
                kind: InsightKind::Concern,
                confidence: 0.8,
                statement: format!("Dominant case risk: {}", top.name),
                evidence: evidence.clone(),
                priority: priority_for(level),
                action_required: top.score() >= 0.5,
                suggested_action: Some(top.mitigation.clone()),
                cost_implication: None,
            });
        }

        let risk_factors = matched.into_iter().map(|(factor, _)| factor).collect();
        Ok(PartialFindings {
            insights,
            risk_factors,
            ..PartialFindings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            document_ref: "doc-400".to_string(),
            title: "Caseworker risk note".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn hazard_language_becomes_weighted_factors() {
        let body = "The child is at risk of exclusion following two fixed-term incidents. \
                    Speech therapy provision has not been delivered since September.";
        let findings = RiskSignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.risk_factors.len(), 2);
        let exclusion = findings
            .risk_factors
            .iter()
            .find(|factor| factor.name == "Placement breakdown or exclusion")
            .expect("exclusion factor present");
        assert!((exclusion.score() - 0.56).abs() < 0.001);
    }

    #[tokio::test]
    async fn dominant_factor_is_surfaced_as_concern() {
        let body = "The family report the child is without a placement this term.";
        let findings = RiskSignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert_eq!(findings.insights.len(), 1);
        let insight = &findings.insights[0];
        assert_eq!(insight.kind, InsightKind::Concern);
        assert!(insight.statement.contains("Child without a placement"));
        assert!(insight.action_required);
    }

    #[tokio::test]
    async fn benign_document_raises_no_factors() {
        let body = "The review noted good progress against all outcomes this year.";
        let findings = RiskSignalAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        assert!(findings.risk_factors.is_empty());
        assert!(findings.insights.is_empty());
    }
}
