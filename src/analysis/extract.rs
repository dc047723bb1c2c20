//! Field extraction for one item/entry node.
//!
//! Extraction is layered, most-specific first:
//!
//! 1. The fixed standard vocabulary shared by RSS and Atom (title, link,
//!    description, dates, author, ...)
//! 2. Attributed-link resolution (Atom expresses links as `href` attributes,
//!    RSS as text content)
//! 3. Namespaced extension selectors (`content:encoded`, `dc:*`, `media:*`,
//!    `enclosure`, `itunes:*`)
//! 4. Deep scan: a generic fallback over arbitrary leaf elements that makes
//!    the extractor tolerant of fully unknown dialects
//! 5. A permissive `<img>` scan over the richest HTML-bearing field
//!
//! Extraction is deterministic: identical input yields the identical field
//! set and values on every call.

use crate::analysis::document::Element;
use serde::Serialize;
use std::collections::BTreeMap;

/// Field names looked up directly as children of every item.
const STANDARD_FIELDS: &[&str] = &[
    "title",
    "link",
    "description",
    "pubDate",
    "published",
    "updated",
    "summary",
    "content",
    "author",
    "creator",
    "category",
    "guid",
    "id",
    "comments",
    "source",
];

/// Namespaced/extension selectors, resolved by full tag name anywhere under
/// the item. Keys are flattened `prefix_localname`.
const EXTENSION_SELECTORS: &[&str] = &[
    "content:encoded",
    "dc:creator",
    "dc:date",
    "media:content",
    "media:thumbnail",
    "enclosure",
    "itunes:image",
    "itunes:summary",
    "itunes:subtitle",
];

/// A discovered value for one field on one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Plain trimmed text.
    Text(String),
    /// Structured record from an attribute-bearing element
    /// (enclosure, media:*) or a synthesized `auto_<tag>_attrs` map.
    Record(BTreeMap<String, String>),
    /// Images scraped out of embedded HTML, in document order.
    Images(Vec<ImageRef>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// True when the value carries no content worth counting as an occurrence.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(t) => t.is_empty(),
            FieldValue::Record(r) => r.is_empty(),
            FieldValue::Images(imgs) => imgs.is_empty(),
        }
    }
}

/// One image reference captured from embedded HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Discovered fields for one item. Field names are an open set (deep scan
/// synthesizes `auto_<tag>` / `auto_<tag>_attrs`), so this is an ordered-key
/// map rather than a fixed record. Missing fields are simply absent.
pub type ItemFields = BTreeMap<String, FieldValue>;

/// Extracts all discoverable fields from one item/entry node.
pub fn extract(item: &Element, deep_scan: bool) -> ItemFields {
    let mut fields = ItemFields::new();

    // Layer 1: standard vocabulary, first matching child, non-empty text only
    for &name in STANDARD_FIELDS {
        if let Some(child) = item.child(name) {
            let text = child.text_trimmed();
            if !text.is_empty() {
                fields.insert(name.to_string(), FieldValue::Text(text.to_string()));
            }
        }
    }

    // Layer 2: attributed links (Atom) override plain-text links (RSS)
    resolve_link(item, &mut fields);

    // Layer 3: namespaced extensions
    for &selector in EXTENSION_SELECTORS {
        resolve_extension(item, selector, &mut fields);
    }

    // Layer 4: deep-scan fallback over arbitrary leaves
    if deep_scan {
        deep_scan_leaves(item, &mut fields);
    }

    // Layer 5: embedded images from the richest HTML-bearing field
    if let Some(images) = extract_embedded_images(&fields) {
        fields.insert("extracted_images".to_string(), FieldValue::Images(images));
    }

    fields
}

/// Re-resolves `link`: an `href` attribute wins over text content, and
/// `rel`/`type` attributes are recorded as `link_rel`/`link_type`.
fn resolve_link(item: &Element, fields: &mut ItemFields) {
    let link_el = match item.child("link") {
        Some(el) => el,
        None => return,
    };
    let value = link_el
        .attr("href")
        .map(str::to_string)
        .or_else(|| non_empty(link_el.text_trimmed()));
    if let Some(v) = value {
        fields.insert("link".to_string(), FieldValue::Text(v));
    }
    if let Some(rel) = link_el.attr("rel") {
        fields.insert("link_rel".to_string(), FieldValue::Text(rel.to_string()));
    }
    if let Some(ty) = link_el.attr("type") {
        fields.insert("link_type".to_string(), FieldValue::Text(ty.to_string()));
    }
}

/// Resolves one extension selector to a flattened field, structured for the
/// enclosure/media family, text (with `url`/`href` attribute fallback) for
/// the rest.
fn resolve_extension(item: &Element, selector: &str, fields: &mut ItemFields) {
    let el = match item.descendant(selector) {
        Some(el) => el,
        None => return,
    };
    let key = selector.replace(':', "_");

    let value = match selector {
        "enclosure" => record_from_attrs(el, &["url", "type", "length"]),
        "media:content" => record_from_attrs(el, &["url", "medium", "width", "height", "type"]),
        "media:thumbnail" => record_from_attrs(el, &["url", "width", "height"]),
        _ => non_empty(el.text_trimmed())
            .or_else(|| el.attr("url").map(str::to_string))
            .or_else(|| el.attr("href").map(str::to_string))
            .map(FieldValue::Text),
    };

    if let Some(v) = value {
        if !v.is_empty() {
            fields.insert(key, v);
        }
    }
}

fn record_from_attrs(el: &Element, attrs: &[&str]) -> Option<FieldValue> {
    let record: BTreeMap<String, String> = attrs
        .iter()
        .filter_map(|&a| el.attr(a).map(|v| (a.to_string(), v.to_string())))
        .collect();
    if record.is_empty() {
        None
    } else {
        Some(FieldValue::Record(record))
    }
}

/// Synthesizes `auto_<tag>` (and `auto_<tag>_attrs`) for every descendant
/// leaf element not already covered by the layers above. First occurrence of
/// a tag wins; later duplicates are ignored.
fn deep_scan_leaves(item: &Element, fields: &mut ItemFields) {
    for leaf in item.leaves() {
        let flattened = leaf.name.replace(':', "_");
        if fields.contains_key(&flattened) || fields.contains_key(leaf.local_name()) {
            continue;
        }
        let text = leaf.text_trimmed();
        if text.is_empty() {
            continue;
        }
        let auto_key = format!("auto_{flattened}");
        if fields.contains_key(&auto_key) {
            continue;
        }
        fields.insert(auto_key, FieldValue::Text(text.to_string()));
        if !leaf.attributes.is_empty() {
            let attrs: BTreeMap<String, String> = leaf
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            fields.insert(format!("auto_{flattened}_attrs"), FieldValue::Record(attrs));
        }
    }
}

/// Scans the richest available HTML field (content_encoded > content >
/// description) for `<img>` tags. Returns `None` unless at least one image
/// with a `src` was found.
fn extract_embedded_images(fields: &ItemFields) -> Option<Vec<ImageRef>> {
    let html = ["content_encoded", "content", "description"]
        .iter()
        .find_map(|&k| fields.get(k).and_then(FieldValue::as_text))?;

    let images = scan_img_tags(html);
    if images.is_empty() {
        None
    } else {
        Some(images)
    }
}

/// Permissive `<img>` tag scan — plain string scanning, no HTML parser.
/// Captures `src` (required), `alt`, and numeric `width`/`height`.
fn scan_img_tags(html: &str) -> Vec<ImageRef> {
    let mut images = Vec::new();
    let mut search_from = 0;

    while let Some(start) = find_ascii_ci(html, "<img", search_from) {
        let tag_end = match html.as_bytes()[start..].iter().position(|&b| b == b'>') {
            Some(end) => start + end,
            None => break,
        };
        let tag = &html[start..=tag_end];

        if let Some(src) = extract_attr_value(tag, "src") {
            images.push(ImageRef {
                src: src.to_string(),
                alt: extract_attr_value(tag, "alt").map(str::to_string),
                width: extract_attr_value(tag, "width").and_then(parse_dimension),
                height: extract_attr_value(tag, "height").and_then(parse_dimension),
            });
        }
        search_from = tag_end + 1;
    }

    images
}

/// Byte-windowed, ASCII-case-insensitive substring search. Offsets index the
/// original string, so multi-byte characters never shift them. Both markers
/// searched for here are pure ASCII, so every hit lands on a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let pat = needle.as_bytes();
    haystack
        .as_bytes()
        .get(from..)?
        .windows(pat.len())
        .position(|window| window.eq_ignore_ascii_case(pat))
        .map(|pos| from + pos)
}

fn parse_dimension(value: &str) -> Option<u32> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// Extracts the value of a quoted attribute from a tag string
/// (case-insensitive name, case-preserving value). The name must start at a
/// whitespace boundary, so `data-src=` never satisfies `src`.
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let needle = format!("{attr_name}=");
    let mut from = 0;

    while let Some(pos) = find_ascii_ci(tag, &needle, from) {
        from = pos + needle.len();
        let boundary = tag[..pos]
            .as_bytes()
            .last()
            .is_some_and(|b| b.is_ascii_whitespace());
        if !boundary {
            continue;
        }

        let rest = &tag[pos + needle.len()..];
        let quote = match rest.as_bytes().first() {
            Some(b'"') => '"',
            Some(b'\'') => '\'',
            _ => continue,
        };
        let inner = &rest[1..];
        let end = inner.find(quote)?;
        return Some(&inner[..end]);
    }

    None
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
