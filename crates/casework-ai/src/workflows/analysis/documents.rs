use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Case document resolved from a `document_ref`. Ingestion and OCR happen
/// upstream; by the time a document reaches the analysis core it is plain
/// text plus register metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDocument {
    pub document_ref: String,
    pub title: String,
    /// Date the document entered the case register, when known.
    #[serde(default)]
    pub recorded_on: Option<NaiveDate>,
    pub body: String,
}

/// Storage abstraction for the document register. The register is owned by
/// the case-management layer; the analysis core only reads from it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, document_ref: &str) -> Result<Option<CaseDocument>, StoreError>;
}

/// Error enumeration for document store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document '{document_ref}' could not be read: {detail}")]
    Unreadable {
        document_ref: String,
        detail: String,
    },
}
