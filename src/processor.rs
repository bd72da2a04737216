use crate::error::{Result, ScraperError};
use crate::types::{RawEntity, RawReview};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Punctuation marks that get run-collapsed and edge-stripped.
const TERMINAL_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Date layouts accepted from scraped review dates.
const DATE_INPUT_FORMATS: &[&str] = &["%d %B %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Canonical review-date layout, e.g. `01 January 2023`.
const DATE_OUTPUT_FORMAT: &str = "%d %B %Y";

/// Cleaned output record for one place. Field declaration order is the
/// serialization contract consumed downstream; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEntity {
    pub id: String,
    pub name: String,
    pub properties: Vec<String>,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f64,
    pub url: String,
    pub reviews: Vec<NormalizedReview>,
}

/// Cleaned review record, serialized inside its parent entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedReview {
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub date: String,
    pub url: String,
}

/// Maps raw scrape records into typed, canonically-ordered output records.
///
/// Free text goes through deterministic whitespace/punctuation cleanup;
/// numeric fields are coerced from the strings extraction produced. A
/// non-numeric value here means extraction failed to default it, which is a
/// normalization error for that entity, not a silent fallback.
pub struct Processor {
    whitespace: Regex,
}

impl Processor {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Canonical text cleanup: collapse whitespace runs, collapse runs of a
    /// repeated terminal punctuation mark, then strip leading/trailing
    /// punctuation and whitespace. Idempotent.
    pub fn process_string(&self, text: &str) -> String {
        let collapsed = self.whitespace.replace_all(text.trim(), " ");

        let mut deduped = String::with_capacity(collapsed.len());
        let mut prev: Option<char> = None;
        for c in collapsed.chars() {
            if TERMINAL_PUNCTUATION.contains(&c) && prev == Some(c) {
                continue;
            }
            deduped.push(c);
            prev = Some(c);
        }

        deduped
            .trim_matches(|c| TERMINAL_PUNCTUATION.contains(&c))
            .trim()
            .to_string()
    }

    /// Reformats a review date to `DD Month YYYY`, trying each accepted input
    /// layout. A date in none of them passes through cleaned.
    pub fn process_date(&self, date: &str) -> String {
        let cleaned = self.process_string(date);
        for format in DATE_INPUT_FORMATS {
            if let Ok(parsed) = NaiveDate::parse_from_str(&cleaned, format) {
                return parsed.format(DATE_OUTPUT_FORMAT).to_string();
            }
        }
        cleaned
    }

    fn parse_number(&self, field: &str, value: &str) -> Result<f64> {
        value.trim().parse::<f64>().map_err(|_| ScraperError::Normalization {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn process_review(&self, review: &RawReview) -> Result<NormalizedReview> {
        Ok(NormalizedReview {
            title: self.process_string(&review.title),
            description: self.process_string(&review.description),
            rating: self.parse_number("rating", &review.rating)?,
            date: self.process_date(&review.date),
            url: self.process_string(&review.url),
        })
    }

    /// Builds the output record for one entity. Properties that clean down to
    /// nothing are dropped; order of the rest is preserved, duplicates kept.
    pub fn process_entity(&self, id: &str, raw: &RawEntity) -> Result<NormalizedEntity> {
        let properties: Vec<String> = raw
            .properties
            .iter()
            .map(|p| self.process_string(p))
            .filter(|p| !p.is_empty())
            .collect();

        let reviews: Vec<NormalizedReview> = raw
            .reviews
            .iter()
            .map(|r| self.process_review(r))
            .collect::<Result<_>>()?;

        Ok(NormalizedEntity {
            id: id.to_string(),
            name: self.process_string(&raw.name),
            properties,
            description: self.process_string(&raw.description),
            address: self.process_string(&raw.address),
            latitude: self.parse_number("latitude", &raw.latitude)?,
            longitude: self.parse_number("longitude", &raw.longitude)?,
            rating: self.parse_number("rating", &raw.rating)?,
            url: self.process_string(&raw.url),
            reviews,
        })
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}
