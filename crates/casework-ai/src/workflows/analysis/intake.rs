use std::time::Duration;

use super::domain::{AnalysisDirective, AnalysisRequest, CaseContext};

/// Validation errors raised while resolving an incoming request. Each
/// variant names the offending field; validation stops at the first.
#[derive(Debug, thiserror::Error)]
pub enum RequestViolation {
    #[error("document_ref must not be empty")]
    MissingDocumentRef,
    #[error("document_ref '{0}' may not contain whitespace or control characters")]
    MalformedDocumentRef(String),
    #[error("case_context.case_id must not be empty")]
    MissingCaseId,
    #[error("case_context.child_age {0} is outside the supported range 0-25")]
    ChildAgeOutOfRange(u8),
    #[error("deadline_ms must be greater than zero when supplied")]
    ZeroDeadline,
}

impl RequestViolation {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingDocumentRef | Self::MalformedDocumentRef(_) => "document_ref",
            Self::MissingCaseId => "case_context.case_id",
            Self::ChildAgeOutOfRange(_) => "case_context.child_age",
            Self::ZeroDeadline => "deadline_ms",
        }
    }
}

/// A request that passed validation: trimmed identifiers, pruned context
/// lists, and the caller deadline converted to a duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub document_ref: String,
    pub directive: AnalysisDirective,
    pub context: CaseContext,
    pub deadline: Option<Duration>,
}

/// Pure validation/normalization of the raw request. No side effects; the
/// caller's authorization to see the document is checked upstream.
pub(crate) fn resolve(request: AnalysisRequest) -> Result<ResolvedRequest, RequestViolation> {
    let AnalysisRequest {
        document_ref,
        directive,
        case_context,
        deadline_ms,
    } = request;

    let document_ref = document_ref.trim().to_string();
    if document_ref.is_empty() {
        return Err(RequestViolation::MissingDocumentRef);
    }
    if document_ref
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(RequestViolation::MalformedDocumentRef(document_ref));
    }

    let case_id = case_context.case_id.trim().to_string();
    if case_id.is_empty() {
        return Err(RequestViolation::MissingCaseId);
    }

    if let Some(age) = case_context.child_age {
        if age > 25 {
            return Err(RequestViolation::ChildAgeOutOfRange(age));
        }
    }

    let deadline = match deadline_ms {
        Some(0) => return Err(RequestViolation::ZeroDeadline),
        Some(ms) => Some(Duration::from_millis(ms)),
        None => None,
    };

    let context = CaseContext {
        case_id,
        child_age: case_context.child_age,
        prior_assessment_refs: prune(case_context.prior_assessment_refs),
        current_provision: prune(case_context.current_provision),
        concerns: prune(case_context.concerns),
        focus_hint: case_context
            .focus_hint
            .map(|hint| hint.trim().to_string())
            .filter(|hint| !hint.is_empty()),
    };

    Ok(ResolvedRequest {
        document_ref,
        directive,
        context,
        deadline,
    })
}

fn prune(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            document_ref: " DOC-2026-0141 ".to_string(),
            directive: AnalysisDirective::ComplianceCheck,
            case_context: CaseContext {
                case_id: "EHC-5521".to_string(),
                child_age: Some(9),
                prior_assessment_refs: vec!["DOC-2025-0870".to_string(), "  ".to_string()],
                current_provision: vec![],
                concerns: vec![" speech delay ".to_string()],
                focus_hint: Some("   ".to_string()),
            },
            deadline_ms: Some(4_000),
        }
    }

    #[test]
    fn resolve_trims_and_prunes_context() {
        let resolved = resolve(request()).expect("request is valid");
        assert_eq!(resolved.document_ref, "DOC-2026-0141");
        assert_eq!(resolved.context.prior_assessment_refs.len(), 1);
        assert_eq!(resolved.context.concerns, vec!["speech delay".to_string()]);
        assert!(resolved.context.focus_hint.is_none());
        assert_eq!(resolved.deadline, Some(Duration::from_millis(4_000)));
    }

    #[test]
    fn empty_document_ref_is_rejected_first() {
        let mut bad = request();
        bad.document_ref = "  ".to_string();
        bad.case_context.case_id = String::new();

        let violation = resolve(bad).expect_err("must reject");
        assert!(matches!(violation, RequestViolation::MissingDocumentRef));
        assert_eq!(violation.field(), "document_ref");
    }

    #[test]
    fn internal_whitespace_in_document_ref_is_rejected() {
        let mut bad = request();
        bad.document_ref = "DOC 0141".to_string();

        let violation = resolve(bad).expect_err("must reject");
        assert!(matches!(violation, RequestViolation::MalformedDocumentRef(_)));
    }

    #[test]
    fn child_age_over_25_is_rejected() {
        let mut bad = request();
        bad.case_context.child_age = Some(26);

        let violation = resolve(bad).expect_err("must reject");
        assert_eq!(violation.field(), "case_context.child_age");
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let mut bad = request();
        bad.deadline_ms = Some(0);

        let violation = resolve(bad).expect_err("must reject");
        assert!(matches!(violation, RequestViolation::ZeroDeadline));
    }

    #[test]
    fn boundary_age_is_accepted() {
        let mut ok = request();
        ok.case_context.child_age = Some(25);
        assert!(resolve(ok).is_ok());
    }
}
