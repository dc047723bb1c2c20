//! Quality validation: turns an [`AnalysisResult`] into pass/fail issues,
//! warnings, suggestions, and a 0–100 quality score.
//!
//! Every rule is independent and always evaluated — nothing short-circuits.
//! Issues make the feed invalid; warnings and suggestions never do.

use crate::analysis::aggregate::AnalysisResult;
use serde::Serialize;

/// Core fields a usable feed must serve reliably.
const CORE_FIELDS: &[&str] = &["title", "link", "description"];
/// Any of these counting as reliable satisfies the date rule.
const DATE_FIELDS: &[&str] = &["pubDate", "published", "updated", "dc_date"];
/// Any of these counting as present satisfies the image suggestion rule.
const IMAGE_FIELDS: &[&str] = &[
    "media_content",
    "media_thumbnail",
    "enclosure",
    "itunes_image",
    "extracted_images",
];

const ISSUE_PENALTY: i32 = 20;
const WARNING_PENALTY: i32 = 5;

/// Validation outcome. `is_valid` is true iff `issues` is empty.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub quality_score: u32,
}

/// Evaluates all quality rules against an analysis.
pub fn validate(analysis: &AnalysisResult) -> Validation {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();

    if analysis.item_count == 0 {
        issues.push("feed contains no items".to_string());
    } else if analysis.item_count < 5 {
        warnings.push(format!(
            "low sample size: feed has only {} item(s)",
            analysis.item_count
        ));
    }

    // Core-field reliability is only judgeable when something was sampled;
    // the zero-item case is already its own issue.
    if analysis.samples_analyzed > 0 {
        for &field in CORE_FIELDS {
            let reliability = analysis.reliability_of(field);
            if reliability < 50.0 {
                issues.push(format!(
                    "core field `{field}` is unreliable: present in {reliability:.0}% of sampled items"
                ));
            }
        }
    }

    if !DATE_FIELDS
        .iter()
        .any(|&f| analysis.reliability_of(f) > 70.0)
    {
        warnings.push("no date field exceeds 70% reliability".to_string());
    }

    if !IMAGE_FIELDS
        .iter()
        .any(|&f| analysis.reliability_of(f) > 30.0)
    {
        suggestions.push(
            "no image source detected; items will render without artwork".to_string(),
        );
    }

    if analysis
        .patterns
        .get("title")
        .is_some_and(|p| p.has_html)
    {
        warnings.push("title field contains HTML markup".to_string());
    }

    if analysis.encoding != "utf-8" {
        warnings.push(format!(
            "document encoding is `{}`, not UTF-8",
            analysis.encoding
        ));
    }

    let quality_score = (100
        - ISSUE_PENALTY * issues.len() as i32
        - WARNING_PENALTY * warnings.len() as i32)
        .clamp(0, 100) as u32;

    Validation {
        is_valid: issues.is_empty(),
        issues,
        warnings,
        suggestions,
        quality_score,
    }
}
