//! The extraction pass that opens every pipeline. Pulls the five fact
//! categories out of the document so the downstream analyzers and the
//! statutory rules work from one shared record.

use async_trait::async_trait;

use super::super::analyzer::{AnalyzerError, DocumentAnalyzer, PartialFindings};
use super::super::documents::CaseDocument;
use super::super::domain::CaseContext;
use super::super::extraction::{
    labels, AssessmentMention, ExtractionRecord, InterventionMention, KeyDate, NextStep,
    ProfessionalMention,
};
use super::scan;

const NAMED_CONFIDENCE: f32 = 0.9;
const UNNAMED_CONFIDENCE: f32 = 0.6;

/// Process milestones recognised in dated sentences, most specific first.
const DATE_EVENTS: &[(&str, &str)] = &[
    ("request for an ehc needs assessment", labels::ASSESSMENT_REQUESTED),
    ("request for assessment", labels::ASSESSMENT_REQUESTED),
    ("assessment was requested", labels::ASSESSMENT_REQUESTED),
    ("decision to assess", "Decision to assess"),
    ("final ehc plan", labels::FINAL_PLAN_ISSUED),
    ("final plan", labels::FINAL_PLAN_ISSUED),
    ("draft plan", "Draft plan circulated"),
    ("annual review", labels::ANNUAL_REVIEW_HELD),
    ("advice received", "Professional advice received"),
    ("advice was received", "Professional advice received"),
    ("report dated", "Professional advice received"),
    ("report received", "Professional advice received"),
    ("panel", "Panel meeting"),
];

const ASSESSMENT_TYPES: &[(&str, &str)] = &[
    ("ehc needs assessment", "EHC needs assessment"),
    ("educational psychology assessment", "Educational psychology assessment"),
    ("speech and language assessment", "Speech and language assessment"),
    ("occupational therapy assessment", "Occupational therapy assessment"),
    ("sensory assessment", "Sensory assessment"),
    ("cognitive assessment", "Cognitive assessment"),
    ("parental views", labels::PARENTAL_VIEWS),
    ("parent views", labels::PARENTAL_VIEWS),
    ("views of the parent", labels::PARENTAL_VIEWS),
    ("family views", labels::PARENTAL_VIEWS),
    ("school report", labels::SETTING_ADVICE),
    ("setting report", labels::SETTING_ADVICE),
    ("setting advice", labels::SETTING_ADVICE),
    ("advice from the school", labels::SETTING_ADVICE),
    ("school's advice", labels::SETTING_ADVICE),
];

const INTERVENTIONS: &[&str] = &[
    "speech and language therapy",
    "speech therapy",
    "occupational therapy",
    "physiotherapy",
    "one-to-one support",
    "1:1 support",
    "teaching assistant support",
    "sensory breaks",
    "counselling",
    "mentoring",
    "small group intervention",
    "nurture group",
];

const FREQUENCIES: &[&str] = &[
    "twice weekly",
    "three times a week",
    "weekly",
    "fortnightly",
    "daily",
    "termly",
    "monthly",
    "each week",
    "per week",
    "per term",
];

const NEXT_STEP_MARKERS: &[&str] = &[
    "next step",
    "action required",
    "to be completed",
    "agreed that",
    "will arrange",
    "will refer",
    "to arrange",
    "follow up",
    "follow-up",
];

fn display_role(role: &str) -> String {
    if role == "senco" {
        return "SENCO".to_string();
    }
    role.split_whitespace()
        .map(|word| {
            if word == "camhs" {
                "CAMHS".to_string()
            } else if word == "and" || word == "of" {
                word.to_string()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct FactExtractionAnalyzer;

impl FactExtractionAnalyzer {
    fn extract(&self, document: &CaseDocument, body: &str) -> ExtractionRecord {
        let mut record = ExtractionRecord::default();

        if let Some(recorded) = document.recorded_on {
            record.key_dates.push(KeyDate {
                event: labels::DOCUMENT_RECORDED.to_string(),
                date: recorded,
                confidence: 0.95,
            });
        }

        for sentence in scan::sentences(body) {
            let lower = sentence.to_lowercase();
            let dates = scan::dates_in(sentence);

            if let Some(first_date) = dates.first().copied() {
                if let Some((_, event)) =
                    DATE_EVENTS.iter().find(|(marker, _)| lower.contains(marker))
                {
                    record.key_dates.push(KeyDate {
                        event: (*event).to_string(),
                        date: first_date,
                        confidence: NAMED_CONFIDENCE,
                    });
                }
            }

            for role in scan::PROFESSIONAL_ROLES {
                if !lower.contains(role) {
                    continue;
                }
                match scan::named_person(sentence) {
                    Some(name) => record.professionals.push(ProfessionalMention {
                        name,
                        role: display_role(role),
                        confidence: NAMED_CONFIDENCE,
                    }),
                    None => record.professionals.push(ProfessionalMention {
                        name: "Unnamed".to_string(),
                        role: display_role(role),
                        confidence: UNNAMED_CONFIDENCE,
                    }),
                }
            }

            for (marker, label) in ASSESSMENT_TYPES {
                if !lower.contains(marker) {
                    continue;
                }
                let date = dates.first().copied();
                record.assessments.push(AssessmentMention {
                    assessment_type: (*label).to_string(),
                    date,
                    confidence: if date.is_some() { NAMED_CONFIDENCE } else { 0.7 },
                });
            }

            for marker in INTERVENTIONS {
                if !lower.contains(marker) {
                    continue;
                }
                let frequency = scan::first_phrase_in(&lower, FREQUENCIES)
                    .map(|frequency| frequency.to_string());
                let confidence = if frequency.is_some() { 0.85 } else { 0.65 };
                record.interventions.push(InterventionMention {
                    description: display_role(marker),
                    frequency,
                    confidence,
                });
            }

            if NEXT_STEP_MARKERS.iter().any(|marker| lower.contains(marker)) {
                let owner = scan::named_person(sentence).or_else(|| {
                    scan::first_phrase_in(&lower, scan::PROFESSIONAL_ROLES)
                        .map(display_role)
                });
                let due = dates.first().copied();
                let confidence = if owner.is_some() || due.is_some() { 0.8 } else { 0.6 };
                record.next_steps.push(NextStep {
                    action: scan::excerpt(sentence, 140),
                    owner,
                    due,
                    confidence,
                });
            }
        }

        record
    }
}

#[async_trait]
impl DocumentAnalyzer for FactExtractionAnalyzer {
    fn name(&self) -> &'static str {
        "fact_extraction"
    }

    async fn analyze(
        &self,
        document: &CaseDocument,
        _context: &CaseContext,
    ) -> Result<PartialFindings, AnalyzerError> {
        let body = scan::non_empty_body(document)?;
        Ok(PartialFindings {
            extraction: self.extract(document, body),
            ..PartialFindings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            document_ref: "doc-100".to_string(),
            title: "Annual review record".to_string(),
            recorded_on: NaiveDate::from_ymd_opt(2026, 3, 2),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let result = FactExtractionAnalyzer
            .analyze(&document("   \n  "), &CaseContext::default())
            .await;
        assert!(matches!(result, Err(AnalyzerError::EmptyDocument)));
    }

    #[tokio::test]
    async fn extracts_dates_professionals_and_interventions() {
        let body = "The request for assessment was received on 14 January 2026. \
                    Dr Imogen Clarke, Educational Psychologist, observed the child in class. \
                    Weekly speech and language therapy was delivered by the service. \
                    Next step: the SENCO will arrange a review by 01/06/2026.";
        let findings = FactExtractionAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let record = findings.extraction;

        assert!(record
            .key_dates
            .iter()
            .any(|entry| entry.event == "EHC needs assessment requested"));
        assert!(record
            .key_dates
            .iter()
            .any(|entry| entry.event == "Document recorded"));

        let psychologist = record
            .professionals
            .iter()
            .find(|mention| mention.role == "Educational Psychologist")
            .expect("psychologist extracted");
        assert_eq!(psychologist.name, "Imogen Clarke");
        assert!((psychologist.confidence - 0.9).abs() < f32::EPSILON);

        let therapy = record
            .interventions
            .iter()
            .find(|mention| mention.description == "Speech and Language Therapy")
            .expect("therapy extracted");
        assert_eq!(therapy.frequency.as_deref(), Some("weekly"));

        let step = record.next_steps.first().expect("next step extracted");
        assert_eq!(step.due, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(step.owner.as_deref(), Some("SENCO"));
    }

    #[tokio::test]
    async fn unnamed_role_mentions_carry_reduced_confidence() {
        let body = "The social worker visited the family home";
        let findings = FactExtractionAnalyzer
            .analyze(&document(body), &CaseContext::default())
            .await
            .expect("analyzer succeeds");
        let mention = findings
            .extraction
            .professionals
            .first()
            .expect("role captured");
        assert_eq!(mention.name, "Unnamed");
        assert!((mention.confidence - 0.6).abs() < f32::EPSILON);
    }
}
