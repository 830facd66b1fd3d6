//! Risk synthesis. Analyzer-reported factors are merged with factors
//! derived from failed mandatory verdicts, deduplicated by name, and
//! bucketed on the peak likelihood-times-impact score. Safeguarding
//! signals floor the overall level at High.

use super::domain::{
    ComplianceReport, ComplianceStatus, RiskAssessment, RiskFactor, RiskLevel,
    SafeguardingConcern,
};
use super::extraction::normalize_key;

const BREACH_LIKELIHOOD: f32 = 0.8;
const UNVERIFIED_LIKELIHOOD: f32 = 0.5;

fn impact_for(level: RiskLevel) -> f32 {
    match level {
        RiskLevel::Low => 0.3,
        RiskLevel::Medium => 0.5,
        RiskLevel::High => 0.75,
        RiskLevel::Critical => 0.9,
    }
}

/// Fold compliance failures into the factor list: a breached mandatory
/// requirement is a live risk whether or not an analyzer said so.
fn factors_from_verdicts(report: &ComplianceReport) -> Vec<RiskFactor> {
    report
        .verdicts
        .iter()
        .filter(|verdict| verdict.mandatory)
        .filter_map(|verdict| {
            let likelihood = match verdict.status {
                ComplianceStatus::NonCompliant => BREACH_LIKELIHOOD,
                ComplianceStatus::Partial | ComplianceStatus::Unclear => UNVERIFIED_LIKELIHOOD,
                ComplianceStatus::Compliant => return None,
            };
            let mitigation = verdict
                .remediation
                .first()
                .cloned()
                .unwrap_or_else(|| "Review the requirement with the casework team".to_string());
            Some(RiskFactor {
                name: format!("Statutory exposure: {}", verdict.description),
                likelihood,
                impact: impact_for(verdict.risk_level),
                mitigation,
            })
        })
        .collect()
}

pub(crate) fn assess(
    analyzer_factors: Vec<RiskFactor>,
    report: &ComplianceReport,
    safeguarding: Vec<SafeguardingConcern>,
) -> RiskAssessment {
    let mut merged: Vec<RiskFactor> = Vec::new();
    for factor in analyzer_factors
        .into_iter()
        .chain(factors_from_verdicts(report))
    {
        let key = normalize_key(&factor.name);
        match merged
            .iter_mut()
            .find(|existing| normalize_key(&existing.name) == key)
        {
            Some(existing) => {
                if factor.score() > existing.score() {
                    *existing = factor;
                }
            }
            None => merged.push(factor),
        }
    }
    merged.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.name.cmp(&b.name))
    });

    let peak_score = merged.iter().map(RiskFactor::score).fold(0.0, f32::max);
    let mut overall = RiskLevel::from_score(peak_score);
    let safeguarding_review_required = !safeguarding.is_empty();
    if safeguarding_review_required && overall < RiskLevel::High {
        overall = RiskLevel::High;
    }

    RiskAssessment {
        overall,
        peak_score,
        factors: merged,
        safeguarding_concerns: safeguarding,
        safeguarding_review_required,
    }
}

#[cfg(test)]
mod tests {
    use super::super::domain::{ComplianceVerdict, OverallComplianceStatus};
    use super::*;

    fn factor(name: &str, likelihood: f32, impact: f32) -> RiskFactor {
        RiskFactor {
            name: name.to_string(),
            likelihood,
            impact,
            mitigation: "Review with the team".to_string(),
        }
    }

    fn empty_report() -> ComplianceReport {
        ComplianceReport {
            ruleset_version: "send-2026.1".to_string(),
            overall_status: OverallComplianceStatus::Compliant,
            passes: true,
            verdicts: Vec::new(),
        }
    }

    fn failing_report() -> ComplianceReport {
        ComplianceReport {
            ruleset_version: "send-2026.1".to_string(),
            overall_status: OverallComplianceStatus::NonCompliant,
            passes: false,
            verdicts: vec![ComplianceVerdict {
                requirement_id: "EHC-ASSESS-20W".to_string(),
                description: "EHC needs assessment concluded within the 20-week statutory window"
                    .to_string(),
                mandatory: true,
                status: ComplianceStatus::NonCompliant,
                evidence: "requested 2025-09-01; final plan 2026-03-01 (181 days)".to_string(),
                risk_level: RiskLevel::Critical,
                remediation: vec!["Record the reason for exceeding the 20-week window".to_string()],
            }],
        }
    }

    #[test]
    fn peak_score_buckets_the_overall_level() {
        let assessment = assess(
            vec![factor("Placement breakdown", 0.9, 0.8)],
            &empty_report(),
            Vec::new(),
        );
        assert!((assessment.peak_score - 0.72).abs() < 0.001);
        assert_eq!(assessment.overall, RiskLevel::High);
    }

    #[test]
    fn mandatory_breach_becomes_a_factor() {
        let assessment = assess(Vec::new(), &failing_report(), Vec::new());
        assert_eq!(assessment.factors.len(), 1);
        let breach = &assessment.factors[0];
        assert!(breach.name.starts_with("Statutory exposure"));
        assert!((breach.score() - 0.72).abs() < 0.001);
        assert_eq!(assessment.overall, RiskLevel::High);
    }

    #[test]
    fn duplicate_factors_keep_the_higher_score() {
        let assessment = assess(
            vec![
                factor("Funding shortfall", 0.4, 0.5),
                factor("funding shortfall", 0.7, 0.6),
            ],
            &empty_report(),
            Vec::new(),
        );
        assert_eq!(assessment.factors.len(), 1);
        assert!((assessment.factors[0].score() - 0.42).abs() < 0.001);
    }

    #[test]
    fn adding_a_factor_never_lowers_the_level() {
        let base = assess(
            vec![factor("Attendance", 0.5, 0.5)],
            &empty_report(),
            Vec::new(),
        );
        let extended = assess(
            vec![factor("Attendance", 0.5, 0.5), factor("Placement", 0.9, 0.9)],
            &empty_report(),
            Vec::new(),
        );
        assert!(extended.overall >= base.overall);
        assert!(extended.peak_score >= base.peak_score);
    }

    #[test]
    fn safeguarding_floors_the_level_at_high() {
        let concern = SafeguardingConcern {
            category: "Disclosure".to_string(),
            detail: "Document references \"disclosed\"".to_string(),
            evidence: "The child disclosed an incident".to_string(),
        };
        let assessment = assess(
            vec![factor("Minor admin gap", 0.2, 0.2)],
            &empty_report(),
            vec![concern],
        );
        assert_eq!(assessment.overall, RiskLevel::High);
        assert!(assessment.safeguarding_review_required);
        assert!((assessment.peak_score - 0.04).abs() < 0.001);
    }

    #[test]
    fn quiet_case_is_low_risk() {
        let assessment = assess(Vec::new(), &empty_report(), Vec::new());
        assert_eq!(assessment.overall, RiskLevel::Low);
        assert!(assessment.factors.is_empty());
        assert!(!assessment.safeguarding_review_required);
    }
}
