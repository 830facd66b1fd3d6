//! Statutory compliance rules for SEND casework documents. Each rule is a
//! pure check over the merged findings; the set is versioned so verdicts
//! can be traced back to the rule edition that produced them.

use std::collections::BTreeSet;

use super::domain::{
    AnalysisDirective, CaseContext, ComplianceReport, ComplianceStatus, ComplianceVerdict,
    Insight, InsightKind, OverallComplianceStatus, RiskLevel, SafeguardingConcern,
};
use super::extraction::{labels, ExtractionRecord};

/// Days allowed from assessment request to final plan: 20 weeks.
const STATUTORY_WINDOW_DAYS: i64 = 140;

/// Days after which an annual review is overdue.
const ANNUAL_REVIEW_INTERVAL_DAYS: i64 = 365;

/// Everything a rule may inspect when reaching a verdict.
pub(crate) struct RuleContext<'a> {
    pub extraction: &'a ExtractionRecord,
    pub insights: &'a [Insight],
    pub safeguarding: &'a [SafeguardingConcern],
    pub case: &'a CaseContext,
}

struct RuleOutcome {
    status: ComplianceStatus,
    evidence: String,
    remediation: Vec<String>,
}

impl RuleOutcome {
    fn compliant(evidence: impl Into<String>) -> Self {
        Self {
            status: ComplianceStatus::Compliant,
            evidence: evidence.into(),
            remediation: Vec::new(),
        }
    }

    fn failed(evidence: impl Into<String>, remediation: &[&str]) -> Self {
        Self {
            status: ComplianceStatus::NonCompliant,
            evidence: evidence.into(),
            remediation: remediation.iter().map(|step| (*step).to_string()).collect(),
        }
    }

    fn partial(evidence: impl Into<String>, remediation: &[&str]) -> Self {
        Self {
            status: ComplianceStatus::Partial,
            evidence: evidence.into(),
            remediation: remediation.iter().map(|step| (*step).to_string()).collect(),
        }
    }

    fn unclear(evidence: impl Into<String>, remediation: &[&str]) -> Self {
        Self {
            status: ComplianceStatus::Unclear,
            evidence: evidence.into(),
            remediation: remediation.iter().map(|step| (*step).to_string()).collect(),
        }
    }
}

#[derive(Clone)]
struct StatutoryRule {
    id: &'static str,
    description: &'static str,
    mandatory: bool,
    directives: &'static [AnalysisDirective],
    risk_level: RiskLevel,
    check: fn(&RuleContext) -> RuleOutcome,
}

const CORE_DIRECTIVES: &[AnalysisDirective] = &[
    AnalysisDirective::ComplianceCheck,
    AnalysisDirective::AssessmentReview,
];

fn check_assessment_window(ctx: &RuleContext) -> RuleOutcome {
    let requested = ctx
        .extraction
        .key_dates
        .iter()
        .filter(|entry| entry.event == labels::ASSESSMENT_REQUESTED)
        .map(|entry| entry.date)
        .min();
    let finalised = ctx
        .extraction
        .key_dates
        .iter()
        .filter(|entry| entry.event == labels::FINAL_PLAN_ISSUED)
        .map(|entry| entry.date)
        .max();

    match (requested, finalised) {
        (Some(requested), Some(finalised)) => {
            let elapsed = (finalised - requested).num_days();
            if elapsed <= STATUTORY_WINDOW_DAYS {
                RuleOutcome::compliant(format!(
                    "requested {requested}; final plan {finalised} ({elapsed} days)"
                ))
            } else {
                RuleOutcome::failed(
                    format!("requested {requested}; final plan {finalised} ({elapsed} days)"),
                    &[
                        "Record the reason for exceeding the 20-week window",
                        "Notify the family of the delay and the revised date",
                    ],
                )
            }
        }
        (Some(requested), None) => RuleOutcome::unclear(
            format!("requested {requested}; no final plan date recorded"),
            &["Record the final plan issue date once the plan is sealed"],
        ),
        (None, Some(finalised)) => RuleOutcome::unclear(
            format!("final plan {finalised}; no request date recorded"),
            &["Record the date the assessment request was received"],
        ),
        (None, None) => RuleOutcome::unclear(
            "neither the request date nor the final plan date is recorded",
            &["Date the assessment request and the final plan in the record"],
        ),
    }
}

fn check_parental_views(ctx: &RuleContext) -> RuleOutcome {
    let captured = ctx
        .extraction
        .assessments
        .iter()
        .find(|mention| mention.assessment_type == labels::PARENTAL_VIEWS);
    match captured {
        Some(mention) => match mention.date {
            Some(date) => RuleOutcome::compliant(format!("parental views recorded on {date}")),
            None => RuleOutcome::compliant("parental views are recorded"),
        },
        None => RuleOutcome::failed(
            "no record of the family's views",
            &["Capture the parent or carer views and append them to the record"],
        ),
    }
}

fn check_setting_evidence(ctx: &RuleContext) -> RuleOutcome {
    let advised = ctx
        .extraction
        .assessments
        .iter()
        .any(|mention| mention.assessment_type == labels::SETTING_ADVICE);
    if advised {
        RuleOutcome::compliant("educational setting advice is on file")
    } else {
        RuleOutcome::failed(
            "no advice from the educational setting",
            &["Request written advice from the current setting"],
        )
    }
}

fn check_provision_specificity(ctx: &RuleContext) -> RuleOutcome {
    let interventions = &ctx.extraction.interventions;
    if interventions.is_empty() {
        let evidence = if ctx.case.current_provision.is_empty() {
            "no provision is described".to_string()
        } else {
            format!(
                "case file lists {} provision item(s) but the document describes none",
                ctx.case.current_provision.len()
            )
        };
        return RuleOutcome::unclear(
            evidence,
            &["Describe the provision in place or planned, with frequency"],
        );
    }
    let quantified = interventions
        .iter()
        .filter(|intervention| intervention.frequency.is_some())
        .count();
    if quantified == interventions.len() {
        RuleOutcome::compliant(format!("{quantified} provision item(s), all quantified"))
    } else {
        RuleOutcome::partial(
            format!(
                "{} of {} provision item(s) carry a frequency",
                quantified,
                interventions.len()
            ),
            &["Quantify each provision item so delivery can be verified"],
        )
    }
}

fn check_annual_review(ctx: &RuleContext) -> RuleOutcome {
    let review = ctx
        .extraction
        .key_dates
        .iter()
        .filter(|entry| entry.event == labels::ANNUAL_REVIEW_HELD)
        .map(|entry| entry.date)
        .max();
    let anchor = ctx.extraction.key_dates.iter().map(|entry| entry.date).max();

    match (review, anchor) {
        (Some(review), Some(anchor)) => {
            let elapsed = (anchor - review).num_days();
            if elapsed > ANNUAL_REVIEW_INTERVAL_DAYS {
                RuleOutcome::failed(
                    format!("last annual review {review}, {elapsed} days before the latest entry"),
                    &["Schedule the annual review without further delay"],
                )
            } else {
                RuleOutcome::compliant(format!("annual review held on {review}"))
            }
        }
        _ => RuleOutcome::unclear(
            "no dated annual review in the record",
            &["Record the date the annual review was held"],
        ),
    }
}

fn check_next_steps(ctx: &RuleContext) -> RuleOutcome {
    let steps = &ctx.extraction.next_steps;
    if steps.is_empty() {
        return RuleOutcome::failed(
            "no actionable next steps recorded",
            &["Record the agreed actions with owners and dates"],
        );
    }
    let owned = steps.iter().filter(|step| step.owner.is_some()).count();
    RuleOutcome::compliant(format!(
        "{} next step(s) recorded, {owned} with a named owner",
        steps.len()
    ))
}

fn check_professional_advice(ctx: &RuleContext) -> RuleOutcome {
    let roles: BTreeSet<String> = ctx
        .extraction
        .professionals
        .iter()
        .map(|mention| mention.role.to_lowercase())
        .collect();
    match roles.len() {
        0 => RuleOutcome::unclear(
            "no professional involvement recorded",
            &["Record which professionals have advised on the case"],
        ),
        1 => RuleOutcome::partial(
            "advice from a single professional discipline",
            &["Seek advice from at least one further discipline"],
        ),
        count => RuleOutcome::compliant(format!("advice spans {count} disciplines")),
    }
}

fn check_safeguarding_escalation(ctx: &RuleContext) -> RuleOutcome {
    if ctx.safeguarding.is_empty() {
        return RuleOutcome::compliant("no safeguarding signals identified");
    }
    let referred = ctx
        .safeguarding
        .iter()
        .any(|concern| concern.category == labels::SAFEGUARDING_REFERRAL);
    if referred {
        RuleOutcome::compliant("safeguarding signals are accompanied by referral evidence")
    } else {
        RuleOutcome::failed(
            format!(
                "{} safeguarding signal(s) without referral evidence",
                ctx.safeguarding.len()
            ),
            &[
                "Make a safeguarding referral in line with the local threshold document",
                "Record the referral outcome on the case file",
            ],
        )
    }
}

fn check_cost_transparency(ctx: &RuleContext) -> RuleOutcome {
    let costed = ctx
        .insights
        .iter()
        .any(|insight| insight.kind == InsightKind::Financial && insight.cost_implication.is_some());
    if !costed {
        return RuleOutcome::unclear(
            "no costed provision in the document",
            &["Attach the costed provision breakdown"],
        );
    }
    let unfunded = ctx.insights.iter().any(|insight| {
        insight.kind == InsightKind::Concern
            && insight.action_required
            && insight.statement.to_lowercase().contains("funding")
    });
    if unfunded {
        RuleOutcome::partial(
            "costs are stated but funding is not agreed",
            &["Confirm the funding position for each costed item"],
        )
    } else {
        RuleOutcome::compliant("costs are stated with no funding dispute recorded")
    }
}

const RULES: &[StatutoryRule] = &[
    StatutoryRule {
        id: "EHC-ASSESS-20W",
        description: "EHC needs assessment concluded within the 20-week statutory window",
        mandatory: true,
        directives: &[AnalysisDirective::ComplianceCheck],
        risk_level: RiskLevel::Critical,
        check: check_assessment_window,
    },
    StatutoryRule {
        id: "EHC-PARENT-VIEWS",
        description: "Parent or carer views captured and recorded",
        mandatory: true,
        directives: CORE_DIRECTIVES,
        risk_level: RiskLevel::High,
        check: check_parental_views,
    },
    StatutoryRule {
        id: "EHC-SETTING-EVIDENCE",
        description: "Advice obtained from the child's educational setting",
        mandatory: true,
        directives: CORE_DIRECTIVES,
        risk_level: RiskLevel::High,
        check: check_setting_evidence,
    },
    StatutoryRule {
        id: "EHC-PROVISION-SPECIFIC",
        description: "Provision specified and quantified so delivery can be verified",
        mandatory: true,
        directives: CORE_DIRECTIVES,
        risk_level: RiskLevel::High,
        check: check_provision_specificity,
    },
    StatutoryRule {
        id: "EHC-ANNUAL-REVIEW",
        description: "Annual review held within the last twelve months",
        mandatory: true,
        directives: &[AnalysisDirective::AssessmentReview],
        risk_level: RiskLevel::Medium,
        check: check_annual_review,
    },
    StatutoryRule {
        id: "EHC-OUTCOMES-NEXTSTEPS",
        description: "Actionable next steps recorded against the outcomes",
        mandatory: false,
        directives: CORE_DIRECTIVES,
        risk_level: RiskLevel::Medium,
        check: check_next_steps,
    },
    StatutoryRule {
        id: "EHC-PROFESSIONAL-ADVICE",
        description: "Advice gathered from more than one professional discipline",
        mandatory: false,
        directives: CORE_DIRECTIVES,
        risk_level: RiskLevel::Medium,
        check: check_professional_advice,
    },
    StatutoryRule {
        id: "SAFEGUARD-ESCALATION",
        description: "Safeguarding signals matched by referral evidence",
        mandatory: true,
        directives: &[
            AnalysisDirective::SafeguardingReview,
            AnalysisDirective::RiskAssessment,
        ],
        risk_level: RiskLevel::Critical,
        check: check_safeguarding_escalation,
    },
    StatutoryRule {
        id: "EHC-COST-TRANSPARENCY",
        description: "Costed provision stated with its funding position",
        mandatory: false,
        directives: &[AnalysisDirective::CostAnalysis],
        risk_level: RiskLevel::Low,
        check: check_cost_transparency,
    },
];

/// A versioned edition of the statutory rules. Evaluation is pure, so the
/// same findings against the same edition always give the same report.
#[derive(Clone)]
pub struct ComplianceRuleSet {
    version: String,
    rules: Vec<StatutoryRule>,
}

impl ComplianceRuleSet {
    /// The rule edition shipped with this build.
    pub fn bundled() -> Self {
        Self {
            version: "send-2026.1".to_string(),
            rules: RULES.to_vec(),
        }
    }

    /// Same checks under a different edition label; used when the rules
    /// are reloaded from case-management configuration.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn evaluate(
        &self,
        directive: AnalysisDirective,
        ctx: &RuleContext<'_>,
    ) -> ComplianceReport {
        let verdicts: Vec<ComplianceVerdict> = self
            .rules
            .iter()
            .filter(|rule| rule.directives.contains(&directive))
            .map(|rule| {
                let outcome = (rule.check)(ctx);
                ComplianceVerdict {
                    requirement_id: rule.id.to_string(),
                    description: rule.description.to_string(),
                    mandatory: rule.mandatory,
                    status: outcome.status,
                    evidence: outcome.evidence,
                    risk_level: rule.risk_level,
                    remediation: outcome.remediation,
                }
            })
            .collect();

        let overall_status = aggregate(&verdicts);
        ComplianceReport {
            ruleset_version: self.version.clone(),
            passes: overall_status != OverallComplianceStatus::NonCompliant,
            overall_status,
            verdicts,
        }
    }
}

/// One mandatory failure fails the document. Mandatory partial or unclear
/// findings, or any optional failure, require human review.
fn aggregate(verdicts: &[ComplianceVerdict]) -> OverallComplianceStatus {
    let mut review_required = false;
    for verdict in verdicts {
        match (verdict.mandatory, verdict.status) {
            (true, ComplianceStatus::NonCompliant) => {
                return OverallComplianceStatus::NonCompliant;
            }
            (true, ComplianceStatus::Partial | ComplianceStatus::Unclear)
            | (false, ComplianceStatus::NonCompliant) => review_required = true,
            _ => {}
        }
    }
    if review_required {
        OverallComplianceStatus::ReviewRequired
    } else {
        OverallComplianceStatus::Compliant
    }
}
