use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for completed analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub String);

/// Caller-selected analysis mode. Each variant drives a distinct analyzer
/// pipeline and statutory rule subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDirective {
    AssessmentReview,
    ComplianceCheck,
    RecommendationExtraction,
    RiskAssessment,
    QualityAnalysis,
    TimelineExtraction,
    CostAnalysis,
    SafeguardingReview,
}

impl AnalysisDirective {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::AssessmentReview,
            Self::ComplianceCheck,
            Self::RecommendationExtraction,
            Self::RiskAssessment,
            Self::QualityAnalysis,
            Self::TimelineExtraction,
            Self::CostAnalysis,
            Self::SafeguardingReview,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AssessmentReview => "Assessment Review",
            Self::ComplianceCheck => "Compliance Check",
            Self::RecommendationExtraction => "Recommendation Extraction",
            Self::RiskAssessment => "Risk Assessment",
            Self::QualityAnalysis => "Quality Analysis",
            Self::TimelineExtraction => "Timeline Extraction",
            Self::CostAnalysis => "Cost Analysis",
            Self::SafeguardingReview => "Safeguarding Review",
        }
    }

    /// Accepts snake_case or kebab-case spellings so CLI flags and JSON
    /// payloads can share one parser.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "assessment_review" => Some(Self::AssessmentReview),
            "compliance_check" => Some(Self::ComplianceCheck),
            "recommendation_extraction" => Some(Self::RecommendationExtraction),
            "risk_assessment" => Some(Self::RiskAssessment),
            "quality_analysis" => Some(Self::QualityAnalysis),
            "timeline_extraction" => Some(Self::TimelineExtraction),
            "cost_analysis" => Some(Self::CostAnalysis),
            "safeguarding_review" => Some(Self::SafeguardingReview),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-management context accompanying an analysis request. The caller is
/// responsible for authorization; this core only validates shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseContext {
    pub case_id: String,
    #[serde(default)]
    pub child_age: Option<u8>,
    #[serde(default)]
    pub prior_assessment_refs: Vec<String>,
    #[serde(default)]
    pub current_provision: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub focus_hint: Option<String>,
}

/// Raw analysis request as submitted by the case-management layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub document_ref: String,
    pub directive: AnalysisDirective,
    pub case_context: CaseContext,
    /// Overall wall-clock budget for the request in milliseconds. Absent
    /// means no caller deadline beyond per-analyzer budgets.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

/// Urgency band attached to insights and recommendations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Recommendation,
    Concern,
    Compliance,
    Financial,
    Timeline,
    Quality,
    Safeguarding,
}

impl InsightKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recommendation => "Recommendation",
            Self::Concern => "Concern",
            Self::Compliance => "Compliance",
            Self::Financial => "Financial",
            Self::Timeline => "Timeline",
            Self::Quality => "Quality",
            Self::Safeguarding => "Safeguarding",
        }
    }
}

/// A single analyzer finding surfaced to the caller. Anything flagged
/// `action_required` is lifted to at least `Priority::Medium` before the
/// result is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub confidence: f32,
    pub statement: String,
    pub evidence: String,
    pub priority: Priority,
    pub action_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_implication: Option<String>,
}

/// Verdict for one statutory requirement. `Unclear` means the evidence the
/// rule needs was absent from the extraction; it is never treated as
/// compliant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Partial,
    Unclear,
}

impl ComplianceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-compliant",
            Self::Partial => "Partial",
            Self::Unclear => "Unclear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallComplianceStatus {
    Compliant,
    NonCompliant,
    ReviewRequired,
}

impl OverallComplianceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-compliant",
            Self::ReviewRequired => "Review Required",
        }
    }
}

/// Outcome of evaluating one rule against the extraction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub requirement_id: String,
    pub description: String,
    pub mandatory: bool,
    pub status: ComplianceStatus,
    pub evidence: String,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

/// Aggregated compliance picture for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub ruleset_version: String,
    pub overall_status: OverallComplianceStatus,
    /// False only when a mandatory requirement is non-compliant.
    pub passes: bool,
    pub verdicts: Vec<ComplianceVerdict>,
}

/// Severity band for risk scores bucketed from likelihood × impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bucket a combined likelihood × impact score into a severity band.
    pub fn from_score(score: f32) -> Self {
        if score < 0.25 {
            Self::Low
        } else if score < 0.5 {
            Self::Medium
        } else if score < 0.75 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

/// One identified risk with its mitigation. Likelihood and impact are both
/// kept within [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub likelihood: f32,
    pub impact: f32,
    pub mitigation: String,
}

impl RiskFactor {
    pub fn score(&self) -> f32 {
        (self.likelihood.clamp(0.0, 1.0) * self.impact.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }
}

/// Safeguarding finding. Any concern forces the overall risk to at least
/// `RiskLevel::High` and flags the run for safeguarding review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeguardingConcern {
    pub category: String,
    pub detail: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall: RiskLevel,
    /// Highest likelihood × impact product across factors.
    pub peak_score: f32,
    pub factors: Vec<RiskFactor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safeguarding_concerns: Vec<SafeguardingConcern>,
    pub safeguarding_review_required: bool,
}

/// Qualitative band for the weighted quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl QualityBand {
    pub fn from_score(score: f32) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 75.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Poor => "Poor",
        }
    }
}

/// Document quality dimensions, each within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f32,
    pub clarity: f32,
    pub evidence_strength: f32,
    pub recommendation_quality: f32,
    pub overall: f32,
    pub band: QualityBand,
}

/// Action-required insights bucketed by urgency for downstream planning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub immediate: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_term: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub long_term: Vec<String>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.short_term.is_empty() && self.long_term.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_runs_low_to_critical() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn risk_buckets_follow_fixed_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.24), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.49), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.72), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.75), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn quality_bands_follow_fixed_thresholds() {
        assert_eq!(QualityBand::from_score(95.0), QualityBand::Excellent);
        assert_eq!(QualityBand::from_score(90.0), QualityBand::Excellent);
        assert_eq!(QualityBand::from_score(82.5), QualityBand::Good);
        assert_eq!(QualityBand::from_score(60.0), QualityBand::Acceptable);
        assert_eq!(QualityBand::from_score(59.9), QualityBand::Poor);
    }

    #[test]
    fn directive_parser_accepts_both_spellings() {
        assert_eq!(
            AnalysisDirective::parse("compliance_check"),
            Some(AnalysisDirective::ComplianceCheck)
        );
        assert_eq!(
            AnalysisDirective::parse("Safeguarding-Review"),
            Some(AnalysisDirective::SafeguardingReview)
        );
        assert_eq!(AnalysisDirective::parse("sentiment"), None);
    }

    #[test]
    fn risk_factor_score_is_clamped() {
        let factor = RiskFactor {
            name: "overrun".to_string(),
            likelihood: 1.4,
            impact: 0.5,
            mitigation: String::new(),
        };
        assert!((factor.score() - 0.5).abs() < f32::EPSILON);
    }
}
