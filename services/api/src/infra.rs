use async_trait::async_trait;
use casework_ai::workflows::analysis::domain::AnalysisDirective;
use casework_ai::workflows::analysis::{CaseDocument, DocumentStore, StoreError};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Register-backed document store held in memory. The service treats the
/// register as read-only once seeded.
pub(crate) struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, CaseDocument>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn with_documents(documents: Vec<CaseDocument>) -> Self {
        let map = documents
            .into_iter()
            .map(|document| (document.document_ref.clone(), document))
            .collect();
        Self {
            documents: Mutex::new(map),
        }
    }

    pub(crate) fn document_count(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch(&self, document_ref: &str) -> Result<Option<CaseDocument>, StoreError> {
        let guard = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(document_ref).cloned())
    }
}

/// Sample SEND register used when no CSV export is supplied. Each entry is
/// written to exercise a different analysis directive in the demo.
pub(crate) fn sample_register() -> Vec<CaseDocument> {
    vec![
        CaseDocument {
            document_ref: "DOC-2026-0305".to_string(),
            title: "EHC assessment summary".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 3, 25),
            body: "Request for assessment received on 14 November 2025. \
                   The final EHC plan was issued on 20 March 2026. \
                   Parental views were gathered at the review meeting on 5 March 2026. \
                   The setting advice from Ferry Lane Primary arrived on 12 February 2026. \
                   Dr Sarah Okafor, Speech and Language Therapist, recommended weekly \
                   speech and language therapy. \
                   The process remains within statutory timescales. \
                   Next step: the SENCO will arrange the transition visit by 28/04/2026."
                .to_string(),
        },
        CaseDocument {
            document_ref: "DOC-2026-0412".to_string(),
            title: "Caseworker chronology".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 4, 2),
            body: "Request for assessment received on 11 August 2025. \
                   The plan is overdue and has not yet been issued. \
                   Speech and language therapy provision has not been delivered since January. \
                   The child is at risk of exclusion following two fixed-term suspensions. \
                   Attendance has fallen to 71 per cent this term. \
                   The family have asked about mediation."
                .to_string(),
        },
        CaseDocument {
            document_ref: "DOC-2026-0233".to_string(),
            title: "Pastoral log extract".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 2, 18),
            body: "The class teacher reported that the child disclosed an incident at home. \
                   A referral to social care was made the same day and the outcome is awaited."
                .to_string(),
        },
        CaseDocument {
            document_ref: "DOC-2026-0518".to_string(),
            title: "Contact note".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 5, 2),
            body: "Phone call with the family. \
                   The next annual review will be planned for the autumn term."
                .to_string(),
        },
    ]
}

pub(crate) fn parse_directive(raw: &str) -> Result<AnalysisDirective, String> {
    AnalysisDirective::parse(raw).ok_or_else(|| {
        format!("unknown directive '{raw}' (try compliance-check, risk-assessment, safeguarding-review, quality-analysis)")
    })
}
