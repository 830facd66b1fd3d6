use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized key shared by duplicate-detection across analyzers: lowercase,
/// single-spaced, trailing punctuation stripped.
pub(crate) fn normalize_key(text: &str) -> String {
    text.trim_start_matches('\u{feff}')
        .split_whitespace()
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', ',', ';', ':'])
        .to_string()
}

/// Canonical labels shared between the extraction pass and the statutory
/// rules, so a rule never misses a fact over a wording mismatch.
pub(crate) mod labels {
    pub const ASSESSMENT_REQUESTED: &str = "EHC needs assessment requested";
    pub const FINAL_PLAN_ISSUED: &str = "Final EHC plan issued";
    pub const ANNUAL_REVIEW_HELD: &str = "Annual review held";
    pub const DOCUMENT_RECORDED: &str = "Document recorded";
    pub const PARENTAL_VIEWS: &str = "Parental views";
    pub const SETTING_ADVICE: &str = "Educational setting advice";
    pub const SAFEGUARDING_REFERRAL: &str = "Professional referral";
}

/// Dated event pulled from the document (request received, advice issued,
/// plan finalised, review held, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDate {
    pub event: String,
    pub date: NaiveDate,
    pub confidence: f32,
}

/// A professional named or referenced in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalMention {
    pub name: String,
    pub role: String,
    pub confidence: f32,
}

/// An assessment, advice source, or captured-views marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentMention {
    pub assessment_type: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub confidence: f32,
}

/// Provision or intervention described in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionMention {
    pub description: String,
    #[serde(default)]
    pub frequency: Option<String>,
    pub confidence: f32,
}

/// A forward-looking action the document commits to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub action: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    pub confidence: f32,
}

/// Coherent record of everything extracted from the document, merged across
/// analyzer outputs and consumed by both the rule evaluator and the risk
/// scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_dates: Vec<KeyDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub professionals: Vec<ProfessionalMention>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assessments: Vec<AssessmentMention>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interventions: Vec<InterventionMention>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<NextStep>,
}

impl ExtractionRecord {
    pub fn fact_count(&self) -> usize {
        self.key_dates.len()
            + self.professionals.len()
            + self.assessments.len()
            + self.interventions.len()
            + self.next_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fact_count() == 0
    }
}

trait KeyedFact {
    fn dedup_key(&self) -> String;
    fn confidence(&self) -> f32;
}

impl KeyedFact for KeyDate {
    fn dedup_key(&self) -> String {
        format!("{}|{}", self.date, normalize_key(&self.event))
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl KeyedFact for ProfessionalMention {
    fn dedup_key(&self) -> String {
        format!("{}|{}", normalize_key(&self.name), normalize_key(&self.role))
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl KeyedFact for AssessmentMention {
    fn dedup_key(&self) -> String {
        match self.date {
            Some(date) => format!("{}|{}", normalize_key(&self.assessment_type), date),
            None => normalize_key(&self.assessment_type),
        }
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl KeyedFact for InterventionMention {
    fn dedup_key(&self) -> String {
        normalize_key(&self.description)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl KeyedFact for NextStep {
    fn dedup_key(&self) -> String {
        normalize_key(&self.action)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Keep the higher-confidence copy of a duplicated fact; on equal confidence
/// the earlier arrival (pipeline declaration order) wins.
fn merge_facts<F: KeyedFact>(into: &mut Vec<F>, incoming: Vec<F>) {
    for fact in incoming {
        let key = fact.dedup_key();
        match into.iter_mut().find(|existing| existing.dedup_key() == key) {
            Some(existing) => {
                if fact.confidence() > existing.confidence() {
                    *existing = fact;
                }
            }
            None => into.push(fact),
        }
    }
}

/// Fan-in point for analyzer extraction output. Partial records are absorbed
/// in pipeline order so duplicate ties resolve to the earlier analyzer.
#[derive(Debug, Default)]
pub struct ExtractionAggregator {
    record: ExtractionRecord,
}

impl ExtractionAggregator {
    pub fn absorb(&mut self, partial: ExtractionRecord) {
        merge_facts(&mut self.record.key_dates, partial.key_dates);
        merge_facts(&mut self.record.professionals, partial.professionals);
        merge_facts(&mut self.record.assessments, partial.assessments);
        merge_facts(&mut self.record.interventions, partial.interventions);
        merge_facts(&mut self.record.next_steps, partial.next_steps);
    }

    pub fn finish(mut self) -> ExtractionRecord {
        self.record
            .key_dates
            .sort_by(|a, b| a.date.cmp(&b.date));
        self.record
    }
}
