use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct RegisterRecord {
    pub(crate) document_ref: String,
    pub(crate) title: String,
    pub(crate) recorded_on: Option<NaiveDate>,
    pub(crate) body: String,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RegisterRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<RegisterRow>() {
        let row = record?;
        records.push(RegisterRecord {
            document_ref: row.document_ref.trim().to_string(),
            title: row.title.trim().to_string(),
            recorded_on: row.recorded_on.as_deref().and_then(parse_recorded_on),
            body: row.body,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RegisterRow {
    #[serde(rename = "Document Ref")]
    document_ref: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(
        rename = "Recorded On",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    recorded_on: Option<String>,
    #[serde(rename = "Body", default)]
    body: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Register exports carry dates either ISO or UK-style; anything else is
/// treated as unknown rather than failing the whole import.
fn parse_recorded_on(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
pub(crate) fn parse_recorded_on_for_tests(value: &str) -> Option<NaiveDate> {
    parse_recorded_on(value)
}
