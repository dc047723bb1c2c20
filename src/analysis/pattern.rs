//! Incremental per-field pattern analysis.
//!
//! A [`FieldPattern`] is a running aggregate over every value observed for
//! one field name. Updates are strictly incremental — one value at a time,
//! never re-scanning history — so the aggregator can fold values in item
//! order with O(1) state per field. The flag/shape fields are fold-order
//! independent; the average length is too, because the running update
//! `(avg * n + len) / (n + 1)` reduces to the arithmetic mean.

use crate::analysis::extract::FieldValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;

/// Content-format signals observed in a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Html,
    Url,
    Date,
    Structured,
}

/// Running aggregate of everything observed for one field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldPattern {
    /// Value shapes seen: `string` and/or `structured`.
    pub shapes: BTreeSet<String>,
    /// Content-format tags seen across values.
    pub formats: BTreeSet<ContentFormat>,
    pub has_html: bool,
    pub has_url: bool,
    pub has_date: bool,
    /// Running mean of string-value lengths (structured values excluded).
    pub avg_length: f64,
    /// Number of string values folded into `avg_length`.
    pub samples: u32,
}

impl FieldPattern {
    /// Folds one observed value into the pattern.
    pub fn observe(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Text(text) => {
                self.shapes.insert("string".to_string());
                if looks_like_html(text) {
                    self.has_html = true;
                    self.formats.insert(ContentFormat::Html);
                }
                if text.contains("http://") || text.contains("https://") {
                    self.has_url = true;
                    self.formats.insert(ContentFormat::Url);
                }
                if looks_like_date(text) {
                    self.has_date = true;
                    self.formats.insert(ContentFormat::Date);
                }
                let n = f64::from(self.samples);
                self.avg_length = (self.avg_length * n + text.len() as f64) / (n + 1.0);
                self.samples += 1;
            }
            FieldValue::Record(_) | FieldValue::Images(_) => {
                self.shapes.insert("structured".to_string());
                self.formats.insert(ContentFormat::Structured);
            }
        }
    }
}

/// Tag-shaped substring check: a `<` immediately followed by a letter or `/`,
/// with a closing `>` somewhere after it.
fn looks_like_html(text: &str) -> bool {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'<' {
            if let Some(&next) = bytes.get(i + 1) {
                if (next.is_ascii_alphabetic() || next == b'/') && text[i..].contains('>') {
                    return true;
                }
            }
        }
    }
    false
}

/// Generic date-likeness probe: RFC 2822 (RSS pubDate), RFC 3339 (Atom),
/// then a short list of common naive formats.
fn looks_like_date(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.len() > 64 {
        return false;
    }
    DateTime::parse_from_rfc2822(text).is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(text, "%d %b %Y").is_ok()
}
