//! Text scanning primitives shared by the analyzer set: sentence splitting,
//! multi-format date recognition, sterling amounts, and person/role spotting.
//! Everything here is deterministic; no clocks, no randomness.

use chrono::NaiveDate;

use super::super::analyzer::AnalyzerError;
use super::super::documents::CaseDocument;

/// Every analyzer starts here: an empty body cannot be analyzed.
pub(crate) fn non_empty_body(document: &CaseDocument) -> Result<&str, AnalyzerError> {
    let body = document.body.trim();
    if body.is_empty() {
        return Err(AnalyzerError::EmptyDocument);
    }
    Ok(body)
}

/// Professional roles recognised across SEND casework documents. Phrases are
/// matched against lowercased text, most specific first.
pub(crate) const PROFESSIONAL_ROLES: &[&str] = &[
    "educational psychologist",
    "speech and language therapist",
    "occupational therapist",
    "physiotherapist",
    "camhs practitioner",
    "specialist teacher",
    "class teacher",
    "headteacher",
    "early years practitioner",
    "school nurse",
    "social worker",
    "paediatrician",
    "case officer",
    "senco",
];

pub(crate) fn sentences(text: &str) -> Vec<&str> {
    text.split(|c: char| matches!(c, '.' | '!' | '?' | '\n' | '\u{2022}'))
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Shorten a passage for use as insight evidence.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// First phrase from `phrases` found in the (already lowercased) text.
pub(crate) fn first_phrase_in<'a>(lower_text: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases
        .iter()
        .copied()
        .find(|phrase| lower_text.contains(phrase))
}

fn strip_ordinal(token: &str) -> &str {
    let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return token;
    }
    match token[digits.len()..].to_ascii_lowercase().as_str() {
        "" | "st" | "nd" | "rd" | "th" => digits,
        _ => token,
    }
}

fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| ",;:()[]'\"".contains(c))
}

/// Parse a single token as an ISO or UK slash date.
pub(crate) fn parse_date_token(raw: &str) -> Option<NaiveDate> {
    let cleaned = trim_punctuation(raw.trim()).trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(date);
        }
    }
    None
}

/// Parse a written date such as "3rd March 2026" from three tokens.
fn parse_long_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let day = strip_ordinal(trim_punctuation(day));
    let month = trim_punctuation(month);
    let year = trim_punctuation(year).trim_end_matches('.');
    if !day.chars().all(|c| c.is_ascii_digit()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let candidate = format!("{day} {month} {year}");
    NaiveDate::parse_from_str(&candidate, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&candidate, "%d %b %Y"))
        .ok()
}

/// All dates recognised in one sentence, in textual order.
pub(crate) fn dates_in(sentence: &str) -> Vec<NaiveDate> {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let mut found = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        if let Some(date) = parse_date_token(tokens[index]) {
            found.push(date);
            index += 1;
            continue;
        }
        if index + 2 < tokens.len() {
            if let Some(date) = parse_long_date(tokens[index], tokens[index + 1], tokens[index + 2])
            {
                found.push(date);
                index += 3;
                continue;
            }
        }
        index += 1;
    }
    found
}

pub(crate) fn first_date_in(sentence: &str) -> Option<NaiveDate> {
    dates_in(sentence).into_iter().next()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AmountHit {
    pub pounds: f64,
    pub raw: String,
    pub line: String,
}

/// Sterling amounts found anywhere in the text, scanned line-by-line so
/// decimal points survive sentence splitting.
pub(crate) fn scan_amounts(text: &str) -> Vec<AmountHit> {
    let mut hits = Vec::new();
    for line in text.lines() {
        let mut rest = line;
        while let Some(pos) = rest.find('£') {
            let after = &rest[pos + '£'.len_utf8()..];
            let token: String = after
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
                .collect();
            let numeric = token.trim_end_matches(['.', ',']);
            let cleaned = numeric.replace(',', "");
            if !cleaned.is_empty() {
                if let Ok(value) = cleaned.parse::<f64>() {
                    hits.push(AmountHit {
                        pounds: value,
                        raw: format!("£{numeric}"),
                        line: line.trim().to_string(),
                    });
                }
            }
            rest = &after[token.len()..];
        }
    }
    hits
}

const NAME_TITLES: &[&str] = &["dr", "mr", "mrs", "ms", "miss", "prof"];

const NAME_STOPWORDS: &[&str] = &[
    "educational",
    "psychologist",
    "speech",
    "language",
    "therapist",
    "occupational",
    "physiotherapist",
    "senco",
    "social",
    "worker",
    "paediatrician",
    "teacher",
    "headteacher",
    "practitioner",
    "camhs",
    "officer",
    "nurse",
    "specialist",
    "the",
    "a",
    "an",
    "ehc",
    "ehcp",
    "send",
    "plan",
    "annual",
    "review",
    "local",
    "authority",
    "school",
];

fn is_capitalized(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_alphabetic() || c == '-'),
        _ => false,
    }
}

fn is_name_stopword(token: &str) -> bool {
    NAME_STOPWORDS.contains(&token.to_ascii_lowercase().as_str())
}

/// Best-effort person name in a sentence: a title-led run of capitalized
/// tokens first, otherwise the first capitalized pair that is not sentence
/// opening and not role vocabulary.
pub(crate) fn named_person(sentence: &str) -> Option<String> {
    let tokens: Vec<&str> = sentence
        .split_whitespace()
        .map(|token| trim_punctuation(token).trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .collect();

    for (index, token) in tokens.iter().enumerate() {
        if NAME_TITLES.contains(&token.to_ascii_lowercase().as_str()) {
            let mut parts: Vec<&str> = Vec::new();
            for follow in tokens.iter().skip(index + 1).take(2) {
                if is_capitalized(follow) && !is_name_stopword(follow) {
                    parts.push(follow);
                } else {
                    break;
                }
            }
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }
    }

    for start in 1..tokens.len().saturating_sub(1) {
        let first = tokens[start];
        let second = tokens[start + 1];
        if is_capitalized(first)
            && is_capitalized(second)
            && second.len() > 1
            && !is_name_stopword(first)
            && !is_name_stopword(second)
        {
            return Some(format!("{first} {second}"));
        }
    }

    None
}
