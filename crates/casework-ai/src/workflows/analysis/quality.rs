//! Quality-metric aggregation and the insight ranking applied to every
//! result before it leaves the service.

use super::analyzer::QualitySignals;
use super::domain::{Insight, Priority, QualityBand, QualityMetrics};

const COMPLETENESS_WEIGHT: f32 = 0.3;
const CLARITY_WEIGHT: f32 = 0.2;
const EVIDENCE_WEIGHT: f32 = 0.3;
const RECOMMENDATION_WEIGHT: f32 = 0.2;

fn dimension_mean(
    signals: &[QualitySignals],
    pick: impl Fn(&QualitySignals) -> Option<f32>,
) -> f32 {
    let values: Vec<f32> = signals
        .iter()
        .filter_map(|signal| pick(signal).map(|value| value.clamp(0.0, 100.0)))
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Combine per-analyzer quality signals into the reported metrics. Each
/// dimension is the clipped mean of the analyzers that scored it; a
/// dimension nobody scored counts as zero. Returns `None` when no
/// analyzer reported any signal at all.
pub(crate) fn aggregate_quality(signals: &[QualitySignals]) -> Option<QualityMetrics> {
    if signals.is_empty() {
        return None;
    }
    let completeness = dimension_mean(signals, |signal| signal.completeness);
    let clarity = dimension_mean(signals, |signal| signal.clarity);
    let evidence_strength = dimension_mean(signals, |signal| signal.evidence_strength);
    let recommendation_quality = dimension_mean(signals, |signal| signal.recommendation_quality);

    let overall = completeness * COMPLETENESS_WEIGHT
        + clarity * CLARITY_WEIGHT
        + evidence_strength * EVIDENCE_WEIGHT
        + recommendation_quality * RECOMMENDATION_WEIGHT;

    Some(QualityMetrics {
        completeness,
        clarity,
        evidence_strength,
        recommendation_quality,
        overall,
        band: QualityBand::from_score(overall),
    })
}

/// Order insights for presentation: priority first, then confidence, with
/// the original analyzer order breaking exact ties. Anything flagged
/// action-required is lifted to at least Medium before sorting.
pub(crate) fn rank_insights(mut insights: Vec<Insight>) -> Vec<Insight> {
    for insight in &mut insights {
        if insight.action_required && insight.priority < Priority::Medium {
            insight.priority = Priority::Medium;
        }
    }
    insights.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
    insights
}
