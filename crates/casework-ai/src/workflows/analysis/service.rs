//! Orchestration service: validates the request, resolves the document,
//! dispatches the analyzer pipeline, and assembles the final judgment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::analyzer::{AnalyzerRegistry, DirectiveCapability};
use super::dispatch;
use super::documents::{DocumentStore, StoreError};
use super::domain::{AnalysisDirective, AnalysisId, AnalysisRequest};
use super::intake::{self, RequestViolation};
use super::report::{self, AnalysisResult};
use super::rules::ComplianceRuleSet;

/// Per-analyzer time budget used when the configuration does not override it.
pub const DEFAULT_ANALYZER_BUDGET: Duration = Duration::from_millis(5_000);

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    InvalidRequest(#[from] RequestViolation),
    #[error("document '{document_ref}' is not in the register")]
    DocumentNotFound { document_ref: String },
    #[error("no analyzer produced findings for the '{directive}' directive")]
    AnalysisUnavailable { directive: AnalysisDirective },
    #[error("request deadline elapsed before any analyzer finished")]
    DeadlineExceeded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues analysis ids and tracks how many times each document has been
/// analyzed by this instance. Failed runs do not consume a revision.
struct AnalysisLedger {
    sequence: AtomicU64,
    revisions: Mutex<HashMap<String, u64>>,
}

impl AnalysisLedger {
    fn new() -> Self {
        Self {
            sequence: AtomicU64::new(1),
            revisions: Mutex::new(HashMap::new()),
        }
    }

    fn begin(&self, document_ref: &str) -> (AnalysisId, u64) {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut revisions = self
            .revisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let revision = revisions
            .entry(document_ref.to_string())
            .and_modify(|revision| *revision += 1)
            .or_insert(1);
        (AnalysisId(format!("an-{id:06}")), *revision)
    }
}

/// Service composing the document register, analyzer registry, and the
/// statutory rule set behind one async `analyze` entry point.
pub struct DocumentAnalysisService<S> {
    store: Arc<S>,
    registry: Arc<AnalyzerRegistry>,
    rules: RwLock<Arc<ComplianceRuleSet>>,
    ledger: AnalysisLedger,
    analyzer_budget: Duration,
}

impl<S> DocumentAnalysisService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_registry(store, AnalyzerRegistry::standard())
    }

    pub fn with_registry(store: Arc<S>, registry: AnalyzerRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
            rules: RwLock::new(Arc::new(ComplianceRuleSet::bundled())),
            ledger: AnalysisLedger::new(),
            analyzer_budget: DEFAULT_ANALYZER_BUDGET,
        }
    }

    pub fn with_analyzer_budget(mut self, budget: Duration) -> Self {
        self.analyzer_budget = budget;
        self
    }

    /// Swap the statutory rule set without a restart. Requests already in
    /// flight keep the set they started with.
    pub fn reload_rules(&self, rules: ComplianceRuleSet) {
        let version = rules.version().to_string();
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);
        info!(%version, "statutory rule set reloaded");
    }

    pub fn rules_version(&self) -> String {
        self.current_rules().version().to_string()
    }

    fn current_rules(&self) -> Arc<ComplianceRuleSet> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Directive listing for client-side feature discovery.
    pub fn capabilities(&self) -> Vec<DirectiveCapability> {
        self.registry.capabilities()
    }

    /// Run one analysis end to end. A deadline that cuts the run short is
    /// only an error when nothing completed at all; otherwise the result
    /// is returned with `metadata.partial` set.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let resolved = intake::resolve(request)?;
        debug!(
            document_ref = %resolved.document_ref,
            directive = resolved.directive.label(),
            "request validated"
        );

        let document = self
            .store
            .fetch(&resolved.document_ref)
            .await?
            .ok_or_else(|| AnalysisError::DocumentNotFound {
                document_ref: resolved.document_ref.clone(),
            })?;

        let pipeline = self.registry.pipeline(resolved.directive);
        debug!(
            document_ref = %resolved.document_ref,
            analyzers = pipeline.len(),
            "dispatching analyzer pipeline"
        );
        let document = Arc::new(document);
        let context = Arc::new(resolved.context);

        let outcome = dispatch::run_pipeline(
            pipeline,
            &document,
            &context,
            self.analyzer_budget,
            resolved.deadline,
        )
        .await;

        if outcome.completed.is_empty() {
            if outcome.deadline_hit {
                return Err(AnalysisError::DeadlineExceeded);
            }
            return Err(AnalysisError::AnalysisUnavailable {
                directive: resolved.directive,
            });
        }

        debug!(
            document_ref = %resolved.document_ref,
            completed = outcome.completed.len(),
            "aggregating findings and evaluating rules"
        );
        let (analysis_id, revision) = self.ledger.begin(&resolved.document_ref);
        let rules = self.current_rules();
        let result = report::assemble(
            analysis_id,
            revision,
            resolved.document_ref,
            resolved.directive,
            &context,
            outcome,
            &rules,
            started.elapsed().as_millis() as u64,
        );

        info!(
            analysis_id = %result.analysis_id.0,
            document_ref = %result.document_ref,
            directive = resolved.directive.label(),
            analyzers = result.metadata.analyzers_completed.len(),
            partial = result.metadata.partial,
            elapsed_ms = result.metadata.processing_time_ms,
            "analysis completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::time::{self, Duration};

    use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
    use super::super::documents::CaseDocument;
    use super::super::domain::{AnalysisDirective, CaseContext};
    use super::*;

    struct MemoryStore {
        documents: Mutex<HashMap<String, CaseDocument>>,
    }

    impl MemoryStore {
        fn with(documents: Vec<CaseDocument>) -> Arc<Self> {
            let map = documents
                .into_iter()
                .map(|doc| (doc.document_ref.clone(), doc))
                .collect();
            Arc::new(Self {
                documents: Mutex::new(map),
            })
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn fetch(&self, document_ref: &str) -> Result<Option<CaseDocument>, StoreError> {
            let guard = self.documents.lock().expect("store mutex poisoned");
            Ok(guard.get(document_ref).cloned())
        }
    }

    struct SlowAnalyzer;

    #[async_trait]
    impl DocumentAnalyzer for SlowAnalyzer {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn analyze(
            &self,
            _document: &CaseDocument,
            _context: &CaseContext,
        ) -> Result<PartialFindings, AnalyzerError> {
            time::sleep(Duration::from_secs(60)).await;
            Ok(PartialFindings::default())
        }
    }

    fn review_document() -> CaseDocument {
        CaseDocument {
            document_ref: "DOC-2026-0141".to_string(),
            title: "Annual review record".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 3, 12),
            body: "Annual review held on 10 March 2026. The SENCO recommends \
                   weekly speech and language therapy. Progress against outcomes \
                   was reviewed with the family."
                .to_string(),
        }
    }

    fn request(document_ref: &str) -> AnalysisRequest {
        AnalysisRequest {
            document_ref: document_ref.to_string(),
            directive: AnalysisDirective::RecommendationExtraction,
            case_context: CaseContext {
                case_id: "EHC-5521".to_string(),
                ..CaseContext::default()
            },
            deadline_ms: None,
        }
    }

    #[tokio::test]
    async fn analyze_returns_a_result_and_counts_revisions() {
        let store = MemoryStore::with(vec![review_document()]);
        let service = DocumentAnalysisService::new(store);

        let first = service
            .analyze(request("DOC-2026-0141"))
            .await
            .expect("first run succeeds");
        let second = service
            .analyze(request("DOC-2026-0141"))
            .await
            .expect("second run succeeds");

        assert_eq!(first.analysis_id.0, "an-000001");
        assert_eq!(first.metadata.revision, 1);
        assert_eq!(second.analysis_id.0, "an-000002");
        assert_eq!(second.metadata.revision, 2);
        assert!(!first.insights.is_empty());
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let store = MemoryStore::with(vec![]);
        let service = DocumentAnalysisService::new(store);

        let error = service
            .analyze(request("DOC-MISSING"))
            .await
            .expect_err("must fail");
        assert!(matches!(error, AnalysisError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_lookup() {
        let store = MemoryStore::with(vec![]);
        let service = DocumentAnalysisService::new(store);

        let error = service
            .analyze(request("  "))
            .await
            .expect_err("must fail");
        assert!(matches!(error, AnalysisError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_pipeline_is_unavailable() {
        let store = MemoryStore::with(vec![review_document()]);
        let service = DocumentAnalysisService::with_registry(store, AnalyzerRegistry::empty());

        let error = service
            .analyze(request("DOC-2026-0141"))
            .await
            .expect_err("must fail");
        assert!(matches!(
            error,
            AnalysisError::AnalysisUnavailable {
                directive: AnalysisDirective::RecommendationExtraction
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_with_no_findings_is_deadline_exceeded() {
        let store = MemoryStore::with(vec![review_document()]);
        let mut registry = AnalyzerRegistry::empty();
        registry.set_pipeline(
            AnalysisDirective::RecommendationExtraction,
            vec![Arc::new(SlowAnalyzer)],
        );
        let service = DocumentAnalysisService::with_registry(store, registry);

        let mut slow = request("DOC-2026-0141");
        slow.deadline_ms = Some(50);
        let error = service.analyze(slow).await.expect_err("must fail");
        assert!(matches!(error, AnalysisError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn reload_swaps_the_rule_version() {
        let store = MemoryStore::with(vec![]);
        let service = DocumentAnalysisService::new(store);
        assert_eq!(service.rules_version(), "send-2026.1");

        service.reload_rules(ComplianceRuleSet::bundled().with_version("send-2026.2"));
        assert_eq!(service.rules_version(), "send-2026.2");
    }
}
