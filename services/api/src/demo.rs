use crate::infra::{sample_register, InMemoryDocumentStore};
use casework_ai::error::AppError;
use casework_ai::workflows::analysis::domain::{AnalysisDirective, AnalysisRequest, CaseContext};
use casework_ai::workflows::analysis::extraction::ExtractionRecord;
use casework_ai::workflows::analysis::{AnalysisResult, CaseDocument, DocumentAnalysisService};
use casework_ai::workflows::register::CaseRegisterImporter;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Document reference to analyze (defaults to the first register entry)
    #[arg(long)]
    pub(crate) document: Option<String>,
    /// Analysis directive, e.g. compliance-check or safeguarding-review
    #[arg(long, value_parser = crate::infra::parse_directive, default_value = "compliance-check")]
    pub(crate) directive: AnalysisDirective,
    /// Register CSV export to analyze instead of the embedded samples
    #[arg(long)]
    pub(crate) register: Option<PathBuf>,
    /// Case identifier recorded against the analysis
    #[arg(long, default_value = "EHC-DEMO-0001")]
    pub(crate) case_id: String,
    /// Overall request deadline in milliseconds
    #[arg(long)]
    pub(crate) deadline_ms: Option<u64>,
    /// Print the full result as JSON instead of the rendered judgment
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Register CSV export to drive the demo instead of the embedded samples
    #[arg(long)]
    pub(crate) register: Option<PathBuf>,
    /// Include the full extraction record in each rendered judgment
    #[arg(long)]
    pub(crate) include_extraction: bool,
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        document,
        directive,
        register,
        case_id,
        deadline_ms,
        json,
    } = args;

    let (documents, imported) = load_register(register)?;
    let Some(first_ref) = documents.first().map(|entry| entry.document_ref.clone()) else {
        println!("The register contains no documents to analyze.");
        return Ok(());
    };
    let document_ref = document.unwrap_or(first_ref);

    let store = Arc::new(InMemoryDocumentStore::with_documents(documents));
    let service = DocumentAnalysisService::new(store);
    let request = AnalysisRequest {
        document_ref,
        directive,
        case_context: CaseContext {
            case_id,
            ..CaseContext::default()
        },
        deadline_ms,
    };

    let result = match service.analyze(request).await {
        Ok(result) => result,
        Err(err) => {
            println!("Analysis failed: {err}");
            return Ok(());
        }
    };

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Result serialization failed: {err}"),
        }
        return Ok(());
    }

    println!(
        "Analyzing {} under {}",
        result.document_ref,
        result.directive.label()
    );
    if imported {
        println!("Register source: CSV export");
    } else {
        println!("Register source: embedded sample register");
    }
    render_analysis(&result, true);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        register,
        include_extraction,
    } = args;

    println!("Casework document intelligence demo");
    let (documents, imported) = load_register(register)?;
    if imported {
        println!("Register source: CSV export");
    } else {
        println!("Register source: embedded sample register");
    }

    println!("\nDocument register ({} documents)", documents.len());
    for document in &documents {
        match document.recorded_on {
            Some(date) => println!(
                "- {} | {} | recorded {}",
                document.document_ref, document.title, date
            ),
            None => println!(
                "- {} | {} | recording date not set",
                document.document_ref, document.title
            ),
        }
    }

    let passes: Vec<(String, AnalysisDirective)> = if imported {
        documents
            .first()
            .map(|document| {
                [
                    AnalysisDirective::ComplianceCheck,
                    AnalysisDirective::RiskAssessment,
                    AnalysisDirective::QualityAnalysis,
                ]
                .into_iter()
                .map(|directive| (document.document_ref.clone(), directive))
                .collect()
            })
            .unwrap_or_default()
    } else {
        vec![
            (
                "DOC-2026-0305".to_string(),
                AnalysisDirective::ComplianceCheck,
            ),
            (
                "DOC-2026-0412".to_string(),
                AnalysisDirective::RiskAssessment,
            ),
            (
                "DOC-2026-0233".to_string(),
                AnalysisDirective::SafeguardingReview,
            ),
            (
                "DOC-2026-0518".to_string(),
                AnalysisDirective::QualityAnalysis,
            ),
        ]
    };

    let store = Arc::new(InMemoryDocumentStore::with_documents(documents));
    let service = DocumentAnalysisService::new(store);

    for (document_ref, directive) in passes {
        println!("\nAnalyzing {} under {}", document_ref, directive.label());
        let request = AnalysisRequest {
            document_ref,
            directive,
            case_context: CaseContext {
                case_id: "EHC-DEMO-0001".to_string(),
                ..CaseContext::default()
            },
            deadline_ms: None,
        };
        match service.analyze(request).await {
            Ok(result) => render_analysis(&result, include_extraction),
            Err(err) => println!("  Analysis failed: {err}"),
        }
    }

    println!("\nSupported directives");
    for capability in service.capabilities() {
        println!(
            "- {}: {} analyzer(s), {} latency, {:?} confidence",
            capability.label,
            capability.analyzers.len(),
            capability.latency_class.label(),
            capability.confidence_class
        );
    }

    Ok(())
}

pub(crate) fn load_register(
    register: Option<PathBuf>,
) -> Result<(Vec<CaseDocument>, bool), AppError> {
    match register {
        Some(path) => CaseRegisterImporter::from_path(path)
            .map(|documents| (documents, true))
            .map_err(AppError::from),
        None => Ok((sample_register(), false)),
    }
}

pub(crate) fn render_analysis(result: &AnalysisResult, include_extraction: bool) {
    println!(
        "Judgment {} | revision {} | confidence {:.2}",
        result.analysis_id.0, result.metadata.revision, result.confidence_score
    );

    println!(
        "\nCompliance: {} (rule set {})",
        result.compliance.overall_status.label(),
        result.compliance.ruleset_version
    );
    if result.compliance.verdicts.is_empty() {
        println!("- no statutory rules bind this directive");
    }
    for verdict in &result.compliance.verdicts {
        println!(
            "- [{}] {}: {}",
            verdict.status.label(),
            verdict.requirement_id,
            verdict.evidence
        );
        for step in &verdict.remediation {
            println!("    -> {}", step);
        }
    }

    println!(
        "\nRisk: {} (peak score {:.2})",
        result.risk.overall.label(),
        result.risk.peak_score
    );
    if result.risk.factors.is_empty() {
        println!("- no weighted risk factors");
    }
    for factor in &result.risk.factors {
        println!(
            "- {} (score {:.2}): {}",
            factor.name,
            factor.score(),
            factor.mitigation
        );
    }
    if result.risk.safeguarding_review_required {
        println!("Safeguarding review required");
        for concern in &result.risk.safeguarding_concerns {
            println!("- {}: {}", concern.category, concern.detail);
        }
    }

    if let Some(quality) = &result.quality {
        println!(
            "\nQuality: {} (overall {:.1})",
            quality.band.label(),
            quality.overall
        );
        println!(
            "- completeness {:.0} | clarity {:.0} | evidence {:.0} | recommendations {:.0}",
            quality.completeness,
            quality.clarity,
            quality.evidence_strength,
            quality.recommendation_quality
        );
    }

    if result.insights.is_empty() {
        println!("\nInsights: none");
    } else {
        println!("\nInsights");
        for insight in &result.insights {
            println!(
                "- [{}] {}: {}",
                insight.priority.label(),
                insight.kind.label(),
                insight.statement
            );
            if let Some(action) = &insight.suggested_action {
                println!("    -> {}", action);
            }
        }
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommended actions");
        for action in &result.recommendations.immediate {
            println!("- immediate: {}", action);
        }
        for action in &result.recommendations.short_term {
            println!("- short term: {}", action);
        }
        for action in &result.recommendations.long_term {
            println!("- long term: {}", action);
        }
    }

    if include_extraction {
        render_extraction(&result.extraction);
    }

    println!(
        "\nAnalyzers: {} | partial: {}",
        result.metadata.analyzers_completed.join(", "),
        result.metadata.partial
    );
    for incident in &result.metadata.incidents {
        println!("- {} did not contribute: {}", incident.analyzer, incident.detail);
    }
}

fn render_extraction(extraction: &ExtractionRecord) {
    println!("\nExtraction record ({} facts)", extraction.fact_count());
    for entry in &extraction.key_dates {
        println!("- {}: {}", entry.date, entry.event);
    }
    for professional in &extraction.professionals {
        println!("- {} ({})", professional.name, professional.role);
    }
    for assessment in &extraction.assessments {
        match assessment.date {
            Some(date) => println!("- {} on {}", assessment.assessment_type, date),
            None => println!("- {}", assessment.assessment_type),
        }
    }
    for intervention in &extraction.interventions {
        match &intervention.frequency {
            Some(frequency) => println!("- {} ({})", intervention.description, frequency),
            None => println!("- {}", intervention.description),
        }
    }
    for step in &extraction.next_steps {
        let owner = step.owner.as_deref().unwrap_or("unassigned");
        match step.due {
            Some(due) => println!("- next step ({owner}, due {due}): {}", step.action),
            None => println!("- next step ({owner}): {}", step.action),
        }
    }
}
