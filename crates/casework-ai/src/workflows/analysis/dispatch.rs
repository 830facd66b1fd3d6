//! Concurrent pipeline dispatch. Analyzers run in parallel tasks, each
//! under its own time budget; an optional overall deadline turns the run
//! into a best-effort partial result instead of an error. Results are
//! collected in declaration order so downstream merging is deterministic
//! no matter which task finishes first.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::warn;

use super::analyzer::{DocumentAnalyzer, PartialFindings};
use super::documents::CaseDocument;
use super::domain::CaseContext;

/// Why an analyzer did not contribute to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentReason {
    /// The analyzer exceeded its own time budget.
    TimedOut,
    /// The analyzer returned an error or panicked.
    Failed,
    /// The overall request deadline arrived first.
    Cancelled,
}

/// Record of a non-contributing analyzer, surfaced in result metadata so
/// callers can see which passes are missing from a degraded run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerIncident {
    pub analyzer: &'static str,
    pub reason: IncidentReason,
    pub detail: String,
}

/// Everything a pipeline run produced, including what it failed to.
#[derive(Debug, Default)]
pub(crate) struct DispatchOutcome {
    pub completed: Vec<(&'static str, PartialFindings)>,
    pub incidents: Vec<AnalyzerIncident>,
    pub deadline_hit: bool,
}

enum TaskFailure {
    TimedOut,
    Failed(String),
}

type TaskResult = Result<PartialFindings, TaskFailure>;

/// Owns the spawned tasks for one run; dropping it aborts whatever is
/// still in flight, so an abandoned request does not keep burning CPU.
struct TaskSet {
    handles: Vec<(&'static str, JoinHandle<TaskResult>)>,
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }
}

pub(crate) async fn run_pipeline(
    pipeline: &[Arc<dyn DocumentAnalyzer>],
    document: &Arc<CaseDocument>,
    context: &Arc<CaseContext>,
    analyzer_budget: Duration,
    deadline: Option<Duration>,
) -> DispatchOutcome {
    let started = Instant::now();
    let mut tasks = TaskSet {
        handles: Vec::with_capacity(pipeline.len()),
    };

    for analyzer in pipeline {
        let name = analyzer.name();
        let analyzer = Arc::clone(analyzer);
        let document = Arc::clone(document);
        let context = Arc::clone(context);
        let handle = tokio::spawn(async move {
            match time::timeout(analyzer_budget, analyzer.analyze(&document, &context)).await {
                Ok(Ok(findings)) => Ok(findings),
                Ok(Err(error)) => Err(TaskFailure::Failed(error.to_string())),
                Err(_) => Err(TaskFailure::TimedOut),
            }
        });
        tasks.handles.push((name, handle));
    }

    let mut outcome = DispatchOutcome::default();
    for (name, handle) in tasks.handles.iter_mut() {
        let name = *name;
        let remaining = deadline.map(|total| total.saturating_sub(started.elapsed()));

        let joined = match remaining {
            Some(budget) if budget.is_zero() => {
                outcome.deadline_hit = true;
                outcome.incidents.push(AnalyzerIncident {
                    analyzer: name,
                    reason: IncidentReason::Cancelled,
                    detail: "request deadline reached before the analyzer finished".to_string(),
                });
                continue;
            }
            Some(budget) => match time::timeout(budget, &mut *handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    outcome.deadline_hit = true;
                    outcome.incidents.push(AnalyzerIncident {
                        analyzer: name,
                        reason: IncidentReason::Cancelled,
                        detail: "request deadline reached before the analyzer finished"
                            .to_string(),
                    });
                    continue;
                }
            },
            None => (&mut *handle).await,
        };

        match joined {
            Ok(Ok(findings)) => outcome.completed.push((name, findings)),
            Ok(Err(TaskFailure::TimedOut)) => {
                warn!(analyzer = name, "analyzer exceeded its time budget");
                outcome.incidents.push(AnalyzerIncident {
                    analyzer: name,
                    reason: IncidentReason::TimedOut,
                    detail: format!(
                        "exceeded the {}ms analyzer budget",
                        analyzer_budget.as_millis()
                    ),
                });
            }
            Ok(Err(TaskFailure::Failed(detail))) => {
                warn!(analyzer = name, %detail, "analyzer failed");
                outcome.incidents.push(AnalyzerIncident {
                    analyzer: name,
                    reason: IncidentReason::Failed,
                    detail,
                });
            }
            Err(join_error) => {
                warn!(analyzer = name, error = %join_error, "analyzer task aborted");
                outcome.incidents.push(AnalyzerIncident {
                    analyzer: name,
                    reason: IncidentReason::Failed,
                    detail: join_error.to_string(),
                });
            }
        }
    }

    outcome
}
