//! The analysis pipeline: parse, detect, sample items, fold patterns, and
//! aggregate per-field reliability into a single [`AnalysisResult`].
//!
//! The result is built once per call and treated as read-only by every
//! downstream consumer (recommender, validator, compatibility checker).
//! There is no cross-call state.

use crate::analysis::detect::{channel_info, detect, ChannelInfo, FeedType};
use crate::analysis::document::{parse_document, Element, ParseError};
use crate::analysis::extract::{extract, FieldValue, ItemFields};
use crate::analysis::pattern::FieldPattern;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum representative samples retained per field.
const MAX_SAMPLES_PER_FIELD: usize = 3;

/// Everything the analyzer learned about one feed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub feed_type: FeedType,
    /// Declared `rss` version attribute (default "2.0"); `None` for non-RSS.
    pub feed_version: Option<String>,
    pub channel: ChannelInfo,
    /// Total items/entries present in the document.
    pub item_count: usize,
    /// Items actually sampled: `min(item_count, sample_size)`.
    pub samples_analyzed: usize,
    /// Unique field names observed across all sampled items, sorted.
    pub fields: Vec<String>,
    /// Per-field reliability: occurrences / samples_analyzed × 100, in [0,100].
    pub reliability: BTreeMap<String, f64>,
    /// Up to 3 representative values per field, in item sampling order.
    pub samples: BTreeMap<String, Vec<FieldValue>>,
    pub patterns: BTreeMap<String, FieldPattern>,
    /// Raw extracted fields, one entry per sampled item.
    pub item_fields: Vec<ItemFields>,
    /// Namespace prefixes declared anywhere in the document.
    pub namespaces: Vec<String>,
    /// Declared document encoding, lowercased.
    pub encoding: String,
}

impl AnalysisResult {
    /// Reliability for a field, 0 when the field was never observed.
    pub fn reliability_of(&self, field: &str) -> f64 {
        self.reliability.get(field).copied().unwrap_or(0.0)
    }

    /// First representative sample for a field, if any.
    pub fn first_sample(&self, field: &str) -> Option<&FieldValue> {
        self.samples.get(field).and_then(|s| s.first())
    }
}

/// Runs the full analysis over raw feed text.
///
/// `sample_size` bounds how many items are extracted and folded; a feed with
/// fewer items than `sample_size` is never over-sampled. `deep_scan` enables
/// the `auto_*` leaf fallback in the extractor.
///
/// # Errors
///
/// [`ParseError`] when the input is not well-formed markup. A well-formed
/// feed with zero items is a valid (if empty) analysis, not an error.
pub fn analyze_content(
    raw: &str,
    sample_size: usize,
    deep_scan: bool,
) -> Result<AnalysisResult, ParseError> {
    let doc = parse_document(raw)?;
    let detection = detect(&doc);
    let channel = channel_info(&doc, detection.feed_type);

    let items = collect_items(&doc.root);
    let item_count = items.len();
    let samples_analyzed = item_count.min(sample_size);

    tracing::debug!(
        feed_type = ?detection.feed_type,
        items = item_count,
        sampling = samples_analyzed,
        deep_scan = deep_scan,
        "analyzing feed structure"
    );

    let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
    let mut patterns: BTreeMap<String, FieldPattern> = BTreeMap::new();
    let mut samples: BTreeMap<String, Vec<FieldValue>> = BTreeMap::new();
    let mut item_fields: Vec<ItemFields> = Vec::with_capacity(samples_analyzed);

    for item in items.iter().take(samples_analyzed) {
        let fields = extract(item, deep_scan);
        for (name, value) in &fields {
            if value.is_empty() {
                continue;
            }
            *occurrences.entry(name.clone()).or_default() += 1;
            patterns.entry(name.clone()).or_default().observe(value);
            let field_samples = samples.entry(name.clone()).or_default();
            if field_samples.len() < MAX_SAMPLES_PER_FIELD {
                field_samples.push(value.clone());
            }
        }
        item_fields.push(fields);
    }

    let reliability: BTreeMap<String, f64> = occurrences
        .iter()
        .map(|(name, &count)| {
            let pct = if samples_analyzed == 0 {
                0.0
            } else {
                count as f64 / samples_analyzed as f64 * 100.0
            };
            (name.clone(), pct)
        })
        .collect();

    Ok(AnalysisResult {
        feed_type: detection.feed_type,
        feed_version: detection.version,
        channel,
        item_count,
        samples_analyzed,
        fields: occurrences.keys().cloned().collect(),
        reliability,
        samples,
        patterns,
        item_fields,
        namespaces: doc.namespaces,
        encoding: doc.encoding,
    })
}

/// Collects item/entry nodes anywhere under the root, by local name. This
/// covers RSS 2.0 (`channel/item`), RSS 1.0 (`RDF/item`), Atom (`feed/entry`)
/// and unknown dialects with one traversal. Matched items are not descended
/// into.
fn collect_items(root: &Element) -> Vec<&Element> {
    let mut items = Vec::new();
    collect_items_into(root, &mut items);
    items
}

fn collect_items_into<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        let local = child.local_name();
        if local == "item" || local == "entry" {
            out.push(child);
        } else {
            collect_items_into(child, out);
        }
    }
}
