pub mod analyzer;
mod analyzers;
mod dispatch;
pub mod documents;
pub mod domain;
pub mod extraction;
mod intake;
mod quality;
mod report;
mod risk;
mod router;
pub mod rules;
mod service;

pub use dispatch::{AnalyzerIncident, IncidentReason};
pub use documents::{CaseDocument, DocumentStore, StoreError};
pub use intake::RequestViolation;
pub use report::{AnalysisMetadata, AnalysisResult};
pub use router::analysis_router;
pub use service::{AnalysisError, DocumentAnalysisService, DEFAULT_ANALYZER_BUDGET};
