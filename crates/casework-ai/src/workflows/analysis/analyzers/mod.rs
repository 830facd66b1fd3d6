//! The built-in analyzer set. Each analyzer is a deterministic,
//! lexicon-driven pass over the document text; none of them consults a
//! clock or external service, so a given document and context always
//! produce the same findings.

pub(crate) mod scan;

mod compliance;
mod cost;
mod extraction;
mod quality;
mod recommendation;
mod review;
mod risk;
mod safeguarding;
mod timeline;

pub use compliance::StatutorySignalAnalyzer;
pub use cost::CostAnalyzer;
pub use extraction::FactExtractionAnalyzer;
pub use quality::WritingQualityAnalyzer;
pub use recommendation::RecommendationAnalyzer;
pub use review::AssessmentReviewAnalyzer;
pub use risk::RiskSignalAnalyzer;
pub use safeguarding::SafeguardingAnalyzer;
pub use timeline::TimelineAnalyzer;
