//! feedlens — schema inference for syndication feeds.
//!
//! Given raw RSS 1.0/2.0, Atom, or unknown-dialect feed content, feedlens
//! discovers which fields exist, how reliably each appears across sampled
//! items, what shape each field's values take, and synthesizes a best-effort
//! mapping from feed fields onto a fixed target schema (title, link,
//! description, content, date, image, author, category) — with a quality
//! score and compatibility flags instead of a bare found/not-found answer.
//!
//! The analyzer is heuristic by design: it tolerates malformed dialects via a
//! deep-scan fallback and is deterministic for a given input, so
//! recommendations are reproducible and testable.
//!
//! # Example
//!
//! ```
//! use feedlens::{analyze_raw, AnalyzeOptions};
//!
//! let rss = r#"<rss version="2.0"><channel>
//!     <item><title>Hello</title><link>https://example.com/1</link></item>
//! </channel></rss>"#;
//!
//! let report = analyze_raw("https://example.com/feed", rss, &AnalyzeOptions::default())?;
//! assert_eq!(report.analysis.item_count, 1);
//! assert_eq!(report.recommended_mappings.title.as_ref().unwrap().source, "title");
//! # Ok::<(), feedlens::AnalyzeError>(())
//! ```

pub mod analysis;
pub mod fetch;
mod report;

pub use report::{
    analyze, analyze_raw, AnalysisReport, AnalyzeError, AnalyzeOptions, FailureReport,
    MappingConfig,
};
