//! Public entry point: fetch a feed, run the analysis pipeline, and assemble
//! the single report handed to callers.
//!
//! Hard failures (validation, fetch, parse) abort the whole analysis and are
//! representable as a `{success: false, error, details}` failure report;
//! there is no partial result. Quality and compatibility problems are always
//! soft and live inside the success report.

use crate::analysis::{
    analyze_content, check_compatibility, recommend, validate, AnalysisResult, Compatibility,
    ParseError, RecommendedMappings, Validation,
};
use crate::fetch::{fetch_feed, FetchError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Tuning knobs for one analysis call.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Maximum number of items to sample (the analyzer never over-samples a
    /// shorter feed).
    pub sample_size: usize,
    /// Enable the `auto_*` deep-scan fallback in the extractor.
    pub deep_scan: bool,
    /// Upper bound on the fetch round-trip.
    pub timeout: Duration,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            sample_size: 5,
            deep_scan: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Hard failures that abort an analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Missing or unusable input; surfaced before any fetch, never retried.
    #[error("validation error: {0}")]
    Validation(String),
    /// The fetch collaborator failed; the caller decides retry policy.
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The feed body is not well-formed markup.
    #[error("feed parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl AnalyzeError {
    /// Stable error code for the failure report.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::Validation(_) => "validation_error",
            AnalyzeError::Fetch(_) => "fetch_error",
            AnalyzeError::Parse(_) => "parse_error",
        }
    }
}

/// The single success artifact of one analysis call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub feed_url: String,
    pub analysis: AnalysisResult,
    pub recommended_mappings: RecommendedMappings,
    pub validation: Validation,
    pub compatibility: Compatibility,
    pub timestamp: DateTime<Utc>,
}

/// Serializable rendition of a hard failure.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
    pub details: String,
}

impl From<&AnalyzeError> for FailureReport {
    fn from(err: &AnalyzeError) -> Self {
        FailureReport {
            success: false,
            error: err.code().to_string(),
            details: err.to_string(),
        }
    }
}

/// Fetches and analyzes one feed.
///
/// `feed_url` is required and must parse as a URL; both checks run before any
/// network activity. Defaults: sample 5 items, deep scan enabled, 30-second
/// fetch timeout.
///
/// # Errors
///
/// [`AnalyzeError::Validation`] for a missing/invalid URL,
/// [`AnalyzeError::Fetch`] when the collaborator fails (status carried in the
/// detail), [`AnalyzeError::Parse`] for non-well-formed feed bodies.
pub async fn analyze(
    client: &reqwest::Client,
    feed_url: &str,
    options: &AnalyzeOptions,
) -> Result<AnalysisReport, AnalyzeError> {
    let feed_url = feed_url.trim();
    if feed_url.is_empty() {
        return Err(AnalyzeError::Validation("feed URL is required".to_string()));
    }
    url::Url::parse(feed_url)
        .map_err(|e| AnalyzeError::Validation(format!("invalid feed URL: {e}")))?;

    let fetched = fetch_feed(client, feed_url, options.timeout).await?;
    tracing::debug!(feed = %feed_url, status = fetched.status, bytes = fetched.body.len(), "feed fetched");

    analyze_raw(feed_url, &fetched.body, options)
}

/// Pure analysis over already-fetched feed text. This is the synchronous,
/// side-effect-free core; concurrent calls share nothing.
pub fn analyze_raw(
    feed_url: &str,
    raw: &str,
    options: &AnalyzeOptions,
) -> Result<AnalysisReport, AnalyzeError> {
    let analysis = analyze_content(raw, options.sample_size, options.deep_scan)?;
    let recommended_mappings = recommend(&analysis);
    let validation = validate(&analysis);
    let compatibility = check_compatibility(&analysis, &recommended_mappings);

    tracing::info!(
        feed = %feed_url,
        feed_type = ?analysis.feed_type,
        items = analysis.item_count,
        fields = analysis.fields.len(),
        quality = validation.quality_score,
        compatible = compatibility.is_compatible,
        "feed analysis complete"
    );

    Ok(AnalysisReport {
        success: true,
        feed_url: feed_url.to_string(),
        analysis,
        recommended_mappings,
        validation,
        compatibility,
        timestamp: Utc::now(),
    })
}

/// Payload for the caller-owned mapping persistence collaborator. The core
/// only produces this; it never writes it anywhere.
#[derive(Debug, Clone, Serialize)]
pub struct MappingConfig {
    pub feed_id: String,
    pub mappings: RecommendedMappings,
    pub field_list: Vec<String>,
    pub reliability_scores: BTreeMap<String, f64>,
    pub analyzed_at: DateTime<Utc>,
    pub quality_score: u32,
}

impl MappingConfig {
    /// Builds the persistence payload from a finished report.
    pub fn from_report(feed_id: &str, report: &AnalysisReport) -> Self {
        MappingConfig {
            feed_id: feed_id.to_string(),
            mappings: report.recommended_mappings.clone(),
            field_list: report.analysis.fields.clone(),
            reliability_scores: report.analysis.reliability.clone(),
            analyzed_at: report.timestamp,
            quality_score: report.validation.quality_score,
        }
    }
}
