//! Writing-quality scoring. Produces the four sub-scores consumed by the
//! quality aggregation; each dimension is a pure function of the text.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings, QualitySignals};
use super::super::documents::CaseDocument;
use super::super::domain::{CaseContext, Insight, InsightKind, Priority};
use super::scan;

/// Section vocabulary a complete casework document is expected to touch.
const SECTION_MARKERS: &[&str] = &[
    "views",
    "provision",
    "outcome",
    "recommendation",
    "background",
    "advice",
    "next step",
];

const RECOMMENDATION_MARKERS: &[&str] = &["recommend", "advised", "should", "proposed"];

fn completeness_score(lower: &str) -> f32 {
    let matched = SECTION_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count() as f32;
    (30.0 + matched * 10.0).clamp(0.0, 100.0)
}

fn clarity_score(body: &str) -> f32 {
    let sentences = scan::sentences(body);
    if sentences.is_empty() {
        return 0.0;
    }
    let words: usize = sentences
        .iter()
        .map(|sentence| scan::word_count(sentence))
        .sum();
    let mean = words as f32 / sentences.len() as f32;
    (110.0 - 2.5 * mean).clamp(0.0, 100.0)
}

fn evidence_score(body: &str) -> f32 {
    let words = scan::word_count(body).max(1) as f32;
    let mut facts = 0usize;
    for sentence in scan::sentences(body) {
        facts += scan::dates_in(sentence).len();
        if scan::named_person(sentence).is_some() {
            facts += 1;
        }
    }
    facts += scan::scan_amounts(body).len();
    let density = facts as f32 * 100.0 / words;
    (20.0 + density * 22.0).clamp(0.0, 100.0)
}

fn recommendation_score(body: &str) -> f32 {
    let mut matched = 0usize;
    let mut dated = false;
    let mut owned = false;
    for sentence in scan::sentences(body) {
        let lower = sentence.to_lowercase();
        if !RECOMMENDATION_MARKERS
            .iter()
            .any(|marker| lower.contains(marker))
        {
            continue;
        }
        matched += 1;
        if scan::first_date_in(sentence).is_some() {
            dated = true;
        }
        if scan::named_person(sentence).is_some()
            || scan::first_phrase_in(&lower, scan::PROFESSIONAL_ROLES).is_some()
        {
            owned = true;
        }
    }
    if matched == 0 {
        return 20.0;
    }
    let mut score = 50.0 + (matched.min(3) as f32) * 10.0;
    if dated {
        score += 10.0;
    }
    if owned {
        score += 10.0;
    }
    score.clamp(0.0, 100.0)
}

pub struct WritingQualityAnalyzer;

#[async_trait]
impl DocumentAnalyzer for WritingQualityAnalyzer {
    fn name(&self) -> &'static str {
        "writing_quality"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        let lower = body.to_lowercase();

        let signals = QualitySignals {
            completeness: Some(completeness_score(&lower)),
            clarity: Some(clarity_score(body)),
            evidence_strength: Some(evidence_score(body)),
            recommendation_quality: Some(recommendation_score(body)),
        };

        let mut insights = Vec::new();
        if signals.completeness.unwrap_or(0.0) < 60.0 {
            insights.push(Insight {
                kind: InsightKind::Quality,
                confidence: 0.8,
                statement: "Expected sections are missing from the document".to_string(),
                evidence: String::new(),
                priority: Priority::Medium,
                action_required: true,
                suggested_action: Some(
                    "Ask the author to cover views, provision, outcomes and next steps"
                        .to_string(),
                ),
                cost_implication: None,
            });
        }
        if signals.clarity.unwrap_or(0.0) < 50.0 {
            insights.push(Insight {
                kind: InsightKind::Quality,
                confidence: 0.75,
                statement: "Long sentences reduce the clarity of the record".to_string(),
                evidence: String::new(),
                priority: Priority::Low,
                action_required: false,
                suggested_action: None,
                cost_implication: None,
            });
        }
        if insights.is_empty() {
            insights.push(Insight {
                kind: InsightKind::Quality,
                confidence: 0.8,
                statement: "Document is well structured and readable".to_string(),
                evidence: String::new(),
                priority: Priority::Low,
                action_required: false,
                suggested_action: None,
                cost_implication: None,
            });
        }

        Ok(PartialFindings {
            insights,
            quality: Some(signals),
            ..PartialFindings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            document_ref: "doc-800".to_string(),
            title: "Draft advice".to_string(),
            recorded_on: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn structured_document_scores_well() {
        let body = "Background: the family moved in 2024. Parental views were gathered. \
                    Provision is one-to-one support. Outcomes were reviewed. \
                    We recommend weekly speech therapy from Dr Imogen Clarke. \
                    Next steps are listed below. Further advice follows.";
        let findings = WritingQualityAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let signals = findings.quality.expect("signals present");
        assert!(signals.completeness.expect("scored") >= 90.0);
        assert!(signals.recommendation_quality.expect("scored") >= 70.0);
        assert_eq!(
            findings.insights[0].statement,
            "Document is well structured and readable"
        );
    }

    #[tokio::test]
    async fn sparse_note_is_flagged_incomplete() {
        let findings = WritingQualityAnalyzer
            .analyze(&document("Phone call with school today"), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let signals = findings.quality.expect("signals present");
        assert!(signals.completeness.expect("scored") < 60.0);
        assert!(findings
            .insights
            .iter()
            .any(|insight| insight.action_required));
    }

    #[tokio::test]
    async fn sub_scores_stay_within_bounds() {
        let long_sentence = format!("word {}", "filler ".repeat(120));
        let findings = WritingQualityAnalyzer
            .analyze(&document(&long_sentence), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let signals = findings.quality.expect("signals present");
        for score in [
            signals.completeness,
            signals.clarity,
            signals.evidence_strength,
            signals.recommendation_quality,
        ] {
            let value = score.expect("scored");
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
