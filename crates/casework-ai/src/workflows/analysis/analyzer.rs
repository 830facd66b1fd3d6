use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::analyzers;
use super::documents::CaseDocument;
use super::domain::{AnalysisDirective, CaseContext, Insight, RiskFactor, SafeguardingConcern};
use super::extraction::ExtractionRecord;

/// Per-dimension quality sub-scores reported by an analyzer, each within
/// [0, 100]. Dimensions an analyzer cannot judge stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualitySignals {
    pub completeness: Option<f32>,
    pub clarity: Option<f32>,
    pub evidence_strength: Option<f32>,
    pub recommendation_quality: Option<f32>,
}

/// Partial result produced by a single analyzer before aggregation.
#[derive(Debug, Clone, Default)]
pub struct PartialFindings {
    pub insights: Vec<Insight>,
    pub extraction: ExtractionRecord,
    pub risk_factors: Vec<RiskFactor>,
    pub safeguarding: Vec<SafeguardingConcern>,
    pub quality: Option<QualitySignals>,
}

/// Error raised by an analyzer run. Failures are recoverable at the
/// pipeline level: the dispatcher records them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("document body is empty")]
    EmptyDocument,
    #[error("analysis failed: {0}")]
    Failed(String),
}

/// A unit that inspects a document and produces partial findings for one
/// analysis directive. Implementations must be pure functions of the
/// document and context so repeated runs give identical verdicts.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(
        &self,
        document: &CaseDocument,
        context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError>;
}

/// Coarse latency expectation for a directive, derived from its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    Fast,
    Standard,
    Thorough,
}

impl LatencyClass {
    fn for_pipeline(len: usize) -> Self {
        match len {
            0 | 1 => Self::Fast,
            2 => Self::Standard,
            _ => Self::Thorough,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Standard => "standard",
            Self::Thorough => "thorough",
        }
    }
}

/// How much weight callers should give confidences for a directive:
/// pattern-extraction pipelines are calibrated, judgment-heavy ones are
/// indicative only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceClass {
    Calibrated,
    Indicative,
}

impl ConfidenceClass {
    pub const fn for_directive(directive: AnalysisDirective) -> Self {
        match directive {
            AnalysisDirective::RecommendationExtraction
            | AnalysisDirective::TimelineExtraction
            | AnalysisDirective::CostAnalysis => Self::Calibrated,
            AnalysisDirective::AssessmentReview
            | AnalysisDirective::ComplianceCheck
            | AnalysisDirective::RiskAssessment
            | AnalysisDirective::QualityAnalysis
            | AnalysisDirective::SafeguardingReview => Self::Indicative,
        }
    }
}

/// Read-only capability row returned by the discovery endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveCapability {
    pub directive: AnalysisDirective,
    pub label: &'static str,
    pub analyzers: Vec<&'static str>,
    pub latency_class: LatencyClass,
    pub confidence_class: ConfidenceClass,
}

/// Registry mapping each directive to its ordered analyzer pipeline. Built
/// once at startup and read-only during request processing.
pub struct AnalyzerRegistry {
    pipelines: HashMap<AnalysisDirective, Vec<Arc<dyn DocumentAnalyzer>>>,
}

impl AnalyzerRegistry {
    /// The production pipeline map. Every directive starts with the general
    /// fact-extraction pass so downstream evaluators always see a populated
    /// extraction record.
    pub fn standard() -> Self {
        let extraction: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::FactExtractionAnalyzer);
        let compliance: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::StatutorySignalAnalyzer);
        let recommendation: Arc<dyn DocumentAnalyzer> =
            Arc::new(analyzers::RecommendationAnalyzer);
        let risk: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::RiskSignalAnalyzer);
        let safeguarding: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::SafeguardingAnalyzer);
        let timeline: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::TimelineAnalyzer);
        let cost: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::CostAnalyzer);
        let quality: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::WritingQualityAnalyzer);
        let review: Arc<dyn DocumentAnalyzer> = Arc::new(analyzers::AssessmentReviewAnalyzer);

        let mut registry = Self {
            pipelines: HashMap::new(),
        };

        registry.set_pipeline(
            AnalysisDirective::AssessmentReview,
            vec![extraction.clone(), review, quality.clone()],
        );
        registry.set_pipeline(
            AnalysisDirective::ComplianceCheck,
            vec![extraction.clone(), compliance],
        );
        registry.set_pipeline(
            AnalysisDirective::RecommendationExtraction,
            vec![extraction.clone(), recommendation],
        );
        registry.set_pipeline(
            AnalysisDirective::RiskAssessment,
            vec![extraction.clone(), risk.clone(), safeguarding.clone()],
        );
        registry.set_pipeline(
            AnalysisDirective::QualityAnalysis,
            vec![extraction.clone(), quality],
        );
        registry.set_pipeline(
            AnalysisDirective::TimelineExtraction,
            vec![extraction.clone(), timeline],
        );
        registry.set_pipeline(AnalysisDirective::CostAnalysis, vec![extraction.clone(), cost]);
        registry.set_pipeline(
            AnalysisDirective::SafeguardingReview,
            vec![extraction, safeguarding, risk],
        );

        registry
    }

    /// Empty registry for tests that assemble bespoke pipelines.
    pub fn empty() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    pub fn set_pipeline(
        &mut self,
        directive: AnalysisDirective,
        analyzers: Vec<Arc<dyn DocumentAnalyzer>>,
    ) {
        self.pipelines.insert(directive, analyzers);
    }

    pub fn register(&mut self, directive: AnalysisDirective, analyzer: Arc<dyn DocumentAnalyzer>) {
        self.pipelines.entry(directive).or_default().push(analyzer);
    }

    pub fn pipeline(&self, directive: AnalysisDirective) -> &[Arc<dyn DocumentAnalyzer>] {
        self.pipelines
            .get(&directive)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Capability listing for client-side feature discovery, in stable
    /// directive order.
    pub fn capabilities(&self) -> Vec<DirectiveCapability> {
        AnalysisDirective::ordered()
            .into_iter()
            .filter(|directive| !self.pipeline(*directive).is_empty())
            .map(|directive| {
                let pipeline = self.pipeline(directive);
                DirectiveCapability {
                    directive,
                    label: directive.label(),
                    analyzers: pipeline.iter().map(|analyzer| analyzer.name()).collect(),
                    latency_class: LatencyClass::for_pipeline(pipeline.len()),
                    confidence_class: ConfidenceClass::for_directive(directive),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_directive() {
        let registry = AnalyzerRegistry::standard();
        for directive in AnalysisDirective::ordered() {
            let pipeline = registry.pipeline(directive);
            assert!(
                !pipeline.is_empty(),
                "no pipeline registered for {directive:?}"
            );
            assert_eq!(
                pipeline[0].name(),
                "fact_extraction",
                "{directive:?} must start with the extraction pass"
            );
        }
    }

    #[test]
    fn capabilities_report_each_directive_once() {
        let registry = AnalyzerRegistry::standard();
        let capabilities = registry.capabilities();
        assert_eq!(capabilities.len(), AnalysisDirective::ordered().len());

        let compliance = capabilities
            .iter()
            .find(|cap| cap.directive == AnalysisDirective::ComplianceCheck)
            .expect("compliance capability listed");
        assert_eq!(compliance.latency_class, LatencyClass::Standard);
        assert_eq!(compliance.confidence_class, ConfidenceClass::Indicative);
    }

    #[test]
    fn unknown_directive_pipeline_is_empty_for_bespoke_registry() {
        let registry = AnalyzerRegistry::empty();
        assert!(registry
            .pipeline(AnalysisDirective::CostAnalysis)
            .is_empty());
        assert!(registry.capabilities().is_empty());
    }
}
