//! Result assembly: merges the partial findings from a pipeline run into
//! the single report returned to the caller. Assembly is pure, so the
//! same dispatch outcome always serializes to the same bytes.

use serde::Serialize;

use super::analyzer::QualitySignals;
use super::dispatch::{AnalyzerIncident, DispatchOutcome};
use super::domain::{
    AnalysisDirective, AnalysisId, CaseContext, ComplianceReport, Insight, Priority,
    QualityMetrics, RecommendationSet, RiskAssessment,
};
use super::extraction::{ExtractionAggregator, ExtractionRecord};
use super::quality::{aggregate_quality, rank_insights};
use super::risk;
use super::rules::{ComplianceRuleSet, RuleContext};

/// Neutral confidence used when a run produced verdicts but no insights.
const NO_INSIGHT_CONFIDENCE: f32 = 0.5;

/// Run bookkeeping attached to every result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// Rule-set edition the verdicts were evaluated against.
    pub ruleset_version: String,
    /// Wall-clock duration measured by the service, request to assembly.
    pub processing_time_ms: u64,
    /// Analyzers that contributed findings, in pipeline order.
    pub analyzers_completed: Vec<String>,
    /// Analyzers that did not contribute, with the reason.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incidents: Vec<AnalyzerIncident>,
    /// Case-context inputs that were populated and visible to analyzers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context_factors: Vec<&'static str>,
    /// True when the request deadline cut the run short.
    pub partial: bool,
    /// True when fewer than two analyzers contributed.
    pub low_confidence_run: bool,
    /// How many times this document has been analyzed by this instance.
    pub revision: u64,
}

/// The complete analysis judgment for one document under one directive.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: AnalysisId,
    pub document_ref: String,
    pub directive: AnalysisDirective,
    pub insights: Vec<Insight>,
    pub extraction: ExtractionRecord,
    pub compliance: ComplianceReport,
    pub risk: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    pub recommendations: RecommendationSet,
    /// Blend of insight confidence and analyzer coverage, within [0, 1].
    pub confidence_score: f32,
    pub metadata: AnalysisMetadata,
}

fn bucket_recommendations(insights: &[Insight]) -> RecommendationSet {
    let mut set = RecommendationSet::default();
    for insight in insights {
        if !insight.action_required {
            continue;
        }
        let action = insight
            .suggested_action
            .clone()
            .unwrap_or_else(|| insight.statement.clone());
        let bucket = match insight.priority {
            Priority::Critical => &mut set.immediate,
            Priority::High => &mut set.short_term,
            Priority::Medium | Priority::Low => &mut set.long_term,
        };
        if !bucket.contains(&action) {
            bucket.push(action);
        }
    }
    set
}

fn context_factors(case: &CaseContext) -> Vec<&'static str> {
    let mut factors = Vec::new();
    if case.child_age.is_some() {
        factors.push("child_age");
    }
    if !case.prior_assessment_refs.is_empty() {
        factors.push("prior_assessment_refs");
    }
    if !case.current_provision.is_empty() {
        factors.push("current_provision");
    }
    if !case.concerns.is_empty() {
        factors.push("concerns");
    }
    if case.focus_hint.is_some() {
        factors.push("focus_hint");
    }
    factors
}

fn confidence_score(insights: &[Insight], completed: usize, planned: usize) -> f32 {
    let coverage = if planned == 0 {
        0.0
    } else {
        completed as f32 / planned as f32
    };
    let base = if insights.is_empty() {
        NO_INSIGHT_CONFIDENCE
    } else {
        let sum: f32 = insights
            .iter()
            .map(|insight| insight.confidence.clamp(0.0, 1.0))
            .sum();
        sum / insights.len() as f32
    };
    (base * coverage).clamp(0.0, 1.0)
}

pub(crate) fn assemble(
    analysis_id: AnalysisId,
    revision: u64,
    document_ref: String,
    directive: AnalysisDirective,
    case: &CaseContext,
    outcome: DispatchOutcome,
    ruleset: &ComplianceRuleSet,
    processing_time_ms: u64,
) -> AnalysisResult {
    let planned = outcome.completed.len() + outcome.incidents.len();
    let completed = outcome.completed.len();

    let mut aggregator = ExtractionAggregator::default();
    let mut insights: Vec<Insight> = Vec::new();
    let mut factors = Vec::new();
    let mut safeguarding = Vec::new();
    let mut signals: Vec<QualitySignals> = Vec::new();
    let mut analyzers_completed = Vec::with_capacity(completed);

    for (name, findings) in outcome.completed {
        analyzers_completed.push(name.to_string());
        aggregator.absorb(findings.extraction);
        insights.extend(findings.insights);
        factors.extend(findings.risk_factors);
        safeguarding.extend(findings.safeguarding);
        if let Some(quality) = findings.quality {
            signals.push(quality);
        }
    }

    let extraction = aggregator.finish();
    let compliance = ruleset.evaluate(
        directive,
        &RuleContext {
            extraction: &extraction,
            insights: &insights,
            safeguarding: &safeguarding,
            case,
        },
    );
    let risk = risk::assess(factors, &compliance, safeguarding);
    let quality = aggregate_quality(&signals);
    let insights = rank_insights(insights);
    let recommendations = bucket_recommendations(&insights);
    let confidence = confidence_score(&insights, completed, planned);

    AnalysisResult {
        analysis_id,
        document_ref,
        directive,
        insights,
        extraction,
        compliance,
        risk,
        quality,
        recommendations,
        confidence_score: confidence,
        metadata: AnalysisMetadata {
            ruleset_version: ruleset.version().to_string(),
            processing_time_ms,
            analyzers_completed,
            incidents: outcome.incidents,
            context_factors: context_factors(case),
            partial: outcome.deadline_hit,
            low_confidence_run: completed < 2,
            revision,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::analyzer::PartialFindings;
    use super::super::dispatch::IncidentReason;
    use super::super::domain::{InsightKind, OverallComplianceStatus, RiskLevel};
    use super::*;

    fn insight(
        statement: &str,
        priority: Priority,
        confidence: f32,
        action_required: bool,
    ) -> Insight {
        Insight {
            kind: InsightKind::Concern,
            confidence,
            statement: statement.to_string(),
            evidence: String::new(),
            priority,
            action_required,
            suggested_action: None,
            cost_implication: None,
        }
    }

    fn outcome_with(findings: Vec<(&'static str, PartialFindings)>) -> DispatchOutcome {
        DispatchOutcome {
            completed: findings,
            incidents: Vec::new(),
            deadline_hit: false,
        }
    }

    fn assemble_simple(outcome: DispatchOutcome) -> AnalysisResult {
        assemble(
            AnalysisId("an-000001".to_string()),
            1,
            "doc-1".to_string(),
            AnalysisDirective::RecommendationExtraction,
            &CaseContext::default(),
            outcome,
            &ComplianceRuleSet::bundled(),
            12,
        )
    }

    #[test]
    fn recommendations_bucket_by_priority() {
        let findings = PartialFindings {
            insights: vec![
                {
                    let mut urgent = insight("act now", Priority::Critical, 0.9, true);
                    urgent.suggested_action = Some("Escalate to the panel today".to_string());
                    urgent
                },
                insight("act soon", Priority::High, 0.8, true),
                insight("act eventually", Priority::Low, 0.7, true),
                insight("background note", Priority::High, 0.9, false),
            ],
            ..PartialFindings::default()
        };
        let result = assemble_simple(outcome_with(vec![
            ("fact_extraction", PartialFindings::default()),
            ("recommendation_extraction", findings),
        ]));

        assert_eq!(
            result.recommendations.immediate,
            vec!["Escalate to the panel today".to_string()]
        );
        assert_eq!(result.recommendations.short_term, vec!["act soon".to_string()]);
        // The Low insight is lifted to Medium by ranking, so it lands in
        // the long-term bucket rather than disappearing.
        assert_eq!(
            result.recommendations.long_term,
            vec!["act eventually".to_string()]
        );
        assert!(!result.metadata.low_confidence_run);
    }

    #[test]
    fn confidence_scales_with_coverage() {
        let findings = PartialFindings {
            insights: vec![insight("only one", Priority::Medium, 0.8, false)],
            ..PartialFindings::default()
        };
        let mut outcome = outcome_with(vec![("fact_extraction", findings)]);
        outcome.incidents.push(AnalyzerIncident {
            analyzer: "recommendation_extraction",
            reason: IncidentReason::TimedOut,
            detail: "exceeded the 5000ms analyzer budget".to_string(),
        });
        let result = assemble_simple(outcome);

        assert!((result.confidence_score - 0.4).abs() < 0.001);
        assert!(result.metadata.low_confidence_run);
        assert_eq!(result.metadata.incidents.len(), 1);
    }

    #[test]
    fn deadline_hit_marks_the_result_partial() {
        let mut outcome = outcome_with(vec![("fact_extraction", PartialFindings::default())]);
        outcome.deadline_hit = true;
        outcome.incidents.push(AnalyzerIncident {
            analyzer: "recommendation_extraction",
            reason: IncidentReason::Cancelled,
            detail: "request deadline reached before the analyzer finished".to_string(),
        });
        let result = assemble_simple(outcome);
        assert!(result.metadata.partial);
    }

    #[test]
    fn empty_run_reports_low_risk_and_trivial_compliance() {
        let result = assemble_simple(outcome_with(vec![(
            "fact_extraction",
            PartialFindings::default(),
        )]));
        assert_eq!(result.risk.overall, RiskLevel::Low);
        assert_eq!(
            result.compliance.overall_status,
            OverallComplianceStatus::Compliant
        );
        assert!(result.quality.is_none());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn metadata_records_the_rule_edition_and_context_inputs() {
        let context = CaseContext {
            case_id: "EHC-5521".to_string(),
            child_age: Some(9),
            concerns: vec!["attendance".to_string()],
            ..CaseContext::default()
        };
        let result = assemble(
            AnalysisId("an-000002".to_string()),
            1,
            "doc-1".to_string(),
            AnalysisDirective::RecommendationExtraction,
            &context,
            outcome_with(vec![("fact_extraction", PartialFindings::default())]),
            &ComplianceRuleSet::bundled(),
            37,
        );

        assert_eq!(result.metadata.ruleset_version, "send-2026.1");
        assert_eq!(result.metadata.processing_time_ms, 37);
        assert_eq!(result.metadata.context_factors, vec!["child_age", "concerns"]);
    }

    #[test]
    fn assembly_is_deterministic_for_identical_outcomes() {
        let build = || {
            let findings = PartialFindings {
                insights: vec![
                    insight("alpha", Priority::High, 0.8, true),
                    insight("beta", Priority::High, 0.8, false),
                ],
                ..PartialFindings::default()
            };
            assemble_simple(outcome_with(vec![
                ("fact_extraction", PartialFindings::default()),
                ("recommendation_extraction", findings),
            ]))
        };
        let first = serde_json::to_vec(&build()).expect("serializes");
        let second = serde_json::to_vec(&build()).expect("serializes");
        assert_eq!(first, second);
    }
}
