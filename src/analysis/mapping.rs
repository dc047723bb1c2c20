//! Mapping recommendation: score candidate source fields per target schema
//! slot and pick the best one, with per-slot reliability thresholds and a
//! best-effort fallback when nothing qualifies.

use crate::analysis::aggregate::AnalysisResult;
use crate::analysis::extract::FieldValue;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Slot candidates
// ============================================================================

// Candidate lists are priority-ordered: the first name meeting the slot's
// threshold wins outright.
const TITLE_CANDIDATES: &[&str] = &["title"];
const LINK_CANDIDATES: &[&str] = &["link"];
const DESCRIPTION_CANDIDATES: &[&str] =
    &["description", "summary", "itunes_summary", "itunes_subtitle"];
const CONTENT_CANDIDATES: &[&str] = &["content_encoded", "content", "description"];
const DATE_CANDIDATES: &[&str] = &["pubDate", "published", "updated", "dc_date"];
const AUTHOR_CANDIDATES: &[&str] = &["author", "dc_creator", "creator"];
const CATEGORY_CANDIDATES: &[&str] = &["category"];

/// Image candidates with their qualifying reliability floors. Order encodes
/// precedence: dedicated image namespaces beat generic enclosures, which beat
/// content-scraped images, which beat podcast-art fallbacks — even when a
/// lower-precedence candidate has higher raw reliability.
const IMAGE_CANDIDATES: &[(&str, f64)] = &[
    ("media_content", 50.0),
    ("media_thumbnail", 50.0),
    ("enclosure", 50.0),
    ("extracted_images", 30.0),
    ("itunes_image", 50.0),
];

// ============================================================================
// Types
// ============================================================================

/// The chosen source field for one target schema slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMapping {
    /// Source field name in the analyzed feed.
    pub source: String,
    /// Reliability of the source field, 0–100.
    pub reliability: f64,
    /// First representative sample observed for the source field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<FieldValue>,
}

/// Recommended source-field mapping per target schema slot. Slots the feed
/// cannot serve at all stay `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecommendedMappings {
    pub title: Option<FieldMapping>,
    pub link: Option<FieldMapping>,
    pub description: Option<FieldMapping>,
    pub content: Option<FieldMapping>,
    pub date: Option<FieldMapping>,
    pub image: Option<FieldMapping>,
    pub author: Option<FieldMapping>,
    pub category: Option<FieldMapping>,
}

impl RecommendedMappings {
    /// All slots with their names, in schema order.
    pub fn slots(&self) -> [(&'static str, Option<&FieldMapping>); 8] {
        [
            ("title", self.title.as_ref()),
            ("link", self.link.as_ref()),
            ("description", self.description.as_ref()),
            ("content", self.content.as_ref()),
            ("date", self.date.as_ref()),
            ("image", self.image.as_ref()),
            ("author", self.author.as_ref()),
            ("category", self.category.as_ref()),
        ]
    }
}

// ============================================================================
// Recommendation
// ============================================================================

/// Builds the full slot → source recommendation for an analyzed feed.
pub fn recommend(analysis: &AnalysisResult) -> RecommendedMappings {
    RecommendedMappings {
        title: find_best_field(analysis, TITLE_CANDIDATES, 90.0),
        link: find_best_field(analysis, LINK_CANDIDATES, 90.0),
        description: find_best_field(analysis, DESCRIPTION_CANDIDATES, 70.0),
        content: find_best_field(analysis, CONTENT_CANDIDATES, 50.0),
        date: find_best_field(analysis, DATE_CANDIDATES, 70.0),
        image: find_image_mapping(analysis),
        author: find_best_field(analysis, AUTHOR_CANDIDATES, 30.0),
        category: find_best_field(analysis, CATEGORY_CANDIDATES, 30.0),
    }
}

/// Picks a source field from a priority-ordered candidate list.
///
/// The first candidate whose reliability meets the threshold wins. If none
/// qualifies, the candidate with the strictly highest reliability wins (ties
/// keep the earlier list position). All-zero reliability yields `None`.
pub fn find_best_field(
    analysis: &AnalysisResult,
    candidates: &[&str],
    threshold: f64,
) -> Option<FieldMapping> {
    for &candidate in candidates {
        if analysis.reliability_of(candidate) >= threshold {
            return Some(mapping_for(analysis, candidate));
        }
    }

    let mut best: Option<(&str, f64)> = None;
    for &candidate in candidates {
        let reliability = analysis.reliability_of(candidate);
        if reliability > 0.0 && best.is_none_or(|(_, r)| reliability > r) {
            best = Some((candidate, reliability));
        }
    }
    best.map(|(name, _)| mapping_for(analysis, name))
}

/// Image selection. Candidates qualify by exceeding their reliability floor;
/// the enclosure path additionally requires its first representative sample
/// to declare an image media type. The first qualifying candidate in
/// precedence order wins.
///
/// The enclosure check deliberately inspects only the first sample — a feed
/// whose first enclosure happens not to be an image skips the enclosure
/// candidate even if later enclosures are images.
fn find_image_mapping(analysis: &AnalysisResult) -> Option<FieldMapping> {
    for &(candidate, floor) in IMAGE_CANDIDATES {
        let reliability = analysis.reliability_of(candidate);
        if reliability <= floor {
            continue;
        }
        if candidate == "enclosure" && !first_enclosure_is_image(analysis) {
            continue;
        }
        return Some(mapping_for(analysis, candidate));
    }
    None
}

fn first_enclosure_is_image(analysis: &AnalysisResult) -> bool {
    analysis
        .first_sample("enclosure")
        .and_then(FieldValue::as_record)
        .and_then(|record| record.get("type"))
        .is_some_and(|ty| ty.starts_with("image"))
}

fn mapping_for(analysis: &AnalysisResult, field: &str) -> FieldMapping {
    FieldMapping {
        source: field.to_string(),
        reliability: analysis.reliability_of(field),
        sample: analysis.first_sample(field).cloned(),
    }
}

// ============================================================================
// Parsing instructions
// ============================================================================

/// A finalized mapping could not be turned into instructions.
#[derive(Debug, Error)]
pub enum InstructionError {
    /// A slot the ingestion pass cannot work without has no mapping.
    #[error("no mapping available for required slot `{0}`")]
    MissingSlot(&'static str),
}

/// Per-slot field-access expressions for a downstream ingestion pass.
///
/// `title` and `link` are required; the remaining slots degrade to `None`
/// rather than emitting an invalid expression.
#[derive(Debug, Clone, Serialize)]
pub struct ParsingInstructions {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

/// Derives field-access expressions from a finalized mapping.
///
/// # Errors
///
/// [`InstructionError::MissingSlot`] when `title` or `link` has no mapping.
pub fn parsing_instructions(
    mappings: &RecommendedMappings,
) -> Result<ParsingInstructions, InstructionError> {
    let title = mappings
        .title
        .as_ref()
        .ok_or(InstructionError::MissingSlot("title"))?;
    let link = mappings
        .link
        .as_ref()
        .ok_or(InstructionError::MissingSlot("link"))?;

    Ok(ParsingInstructions {
        title: text_access(title),
        link: text_access(link),
        description: mappings.description.as_ref().map(text_access),
        content: mappings.content.as_ref().map(text_access),
        date: mappings.date.as_ref().map(text_access),
        image: mappings.image.as_ref().map(image_access),
        author: mappings.author.as_ref().map(text_access),
        category: mappings.category.as_ref().map(text_access),
    })
}

fn text_access(mapping: &FieldMapping) -> String {
    format!("item.{}", mapping.source)
}

/// Image access depends on the source kind: structured media fields carry the
/// URL in an attribute record, scraped images in the first list entry, and
/// itunes art directly as text.
fn image_access(mapping: &FieldMapping) -> String {
    match mapping.source.as_str() {
        "media_content" | "media_thumbnail" | "enclosure" => {
            format!("item.{}.url", mapping.source)
        }
        "extracted_images" => "item.extracted_images[0].src".to_string(),
        other => format!("item.{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::analyze_content;
    use crate::analysis::detect::{ChannelInfo, FeedType};
    use std::collections::BTreeMap;

    /// Builds a bare result with the given per-field reliabilities and
    /// samples; only what the recommender reads.
    fn result_with(
        reliability: &[(&str, f64)],
        samples: &[(&str, FieldValue)],
    ) -> AnalysisResult {
        AnalysisResult {
            feed_type: FeedType::Rss2,
            feed_version: Some("2.0".to_string()),
            channel: ChannelInfo::default(),
            item_count: 10,
            samples_analyzed: 10,
            fields: reliability.iter().map(|(n, _)| n.to_string()).collect(),
            reliability: reliability
                .iter()
                .map(|&(n, r)| (n.to_string(), r))
                .collect(),
            samples: samples
                .iter()
                .map(|(n, v)| (n.to_string(), vec![v.clone()]))
                .collect(),
            patterns: BTreeMap::new(),
            item_fields: Vec::new(),
            namespaces: Vec::new(),
            encoding: "utf-8".to_string(),
        }
    }

    fn record(pairs: &[(&str, &str)]) -> FieldValue {
        FieldValue::Record(
            pairs
                .iter()
                .map(|&(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_find_best_field_threshold_winner() {
        // {a:40, b:95}, threshold 90 → b
        let analysis = result_with(&[("a", 40.0), ("b", 95.0)], &[]);
        let best = find_best_field(&analysis, &["a", "b"], 90.0).unwrap();
        assert_eq!(best.source, "b");
        assert_eq!(best.reliability, 95.0);
    }

    #[test]
    fn test_find_best_field_tie_breaks_by_list_order() {
        // {a:40, b:40}, threshold 90 → neither qualifies, a wins the tie
        let analysis = result_with(&[("a", 40.0), ("b", 40.0)], &[]);
        let best = find_best_field(&analysis, &["a", "b"], 90.0).unwrap();
        assert_eq!(best.source, "a");
    }

    #[test]
    fn test_find_best_field_all_zero_is_absent() {
        let analysis = result_with(&[("a", 0.0)], &[]);
        assert!(find_best_field(&analysis, &["a", "b"], 90.0).is_none());
    }

    #[test]
    fn test_find_best_field_prefers_priority_at_threshold() {
        // Both meet the threshold; the earlier candidate wins even when the
        // later one scores higher.
        let analysis = result_with(&[("a", 92.0), ("b", 99.0)], &[]);
        let best = find_best_field(&analysis, &["a", "b"], 90.0).unwrap();
        assert_eq!(best.source, "a");
    }

    #[test]
    fn test_image_precedence_beats_raw_reliability() {
        // media_content 60 and an image-typed enclosure at 80 both qualify;
        // namespace precedence wins over the higher raw score.
        let analysis = result_with(
            &[("media_content", 60.0), ("enclosure", 80.0)],
            &[
                ("media_content", record(&[("url", "https://x/a.jpg")])),
                (
                    "enclosure",
                    record(&[("url", "https://x/b.jpg"), ("type", "image/jpeg")]),
                ),
            ],
        );
        let image = find_image_mapping(&analysis).unwrap();
        assert_eq!(image.source, "media_content");
        assert_eq!(image.reliability, 60.0);
    }

    #[test]
    fn test_image_enclosure_requires_image_type_sample() {
        let analysis = result_with(
            &[("enclosure", 100.0)],
            &[(
                "enclosure",
                record(&[("url", "https://x/ep.mp3"), ("type", "audio/mpeg")]),
            )],
        );
        assert!(find_image_mapping(&analysis).is_none());
    }

    #[test]
    fn test_image_enclosure_image_type_qualifies() {
        let analysis = result_with(
            &[("enclosure", 100.0)],
            &[(
                "enclosure",
                record(&[("url", "https://x/pic.png"), ("type", "image/png")]),
            )],
        );
        let image = find_image_mapping(&analysis).unwrap();
        assert_eq!(image.source, "enclosure");
    }

    #[test]
    fn test_image_floor_is_strict() {
        // Exactly at the floor does not qualify
        let analysis = result_with(&[("media_content", 50.0)], &[]);
        assert!(find_image_mapping(&analysis).is_none());
    }

    #[test]
    fn test_image_extracted_images_low_floor() {
        let analysis = result_with(&[("extracted_images", 35.0)], &[]);
        let image = find_image_mapping(&analysis).unwrap();
        assert_eq!(image.source, "extracted_images");
    }

    #[test]
    fn test_recommend_end_to_end_rss() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
                <title>A</title><link>https://x/1</link>
                <description>d</description>
                <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
                <dc:creator>Ann</dc:creator>
                <category>tech</category>
            </item>
            <item>
                <title>B</title><link>https://x/2</link>
                <description>d</description>
                <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
                <dc:creator>Ann</dc:creator>
                <category>tech</category>
            </item>
        </channel></rss>"#;
        let analysis = analyze_content(xml, 5, false).unwrap();
        let mappings = recommend(&analysis);

        assert_eq!(mappings.title.as_ref().unwrap().source, "title");
        assert_eq!(mappings.link.as_ref().unwrap().source, "link");
        assert_eq!(mappings.description.as_ref().unwrap().source, "description");
        // content_encoded/content are absent, so description is the first
        // candidate meeting the content threshold
        assert_eq!(mappings.content.as_ref().unwrap().source, "description");
        assert_eq!(mappings.date.as_ref().unwrap().source, "pubDate");
        // no <author> element; dc_creator is next in candidate order
        assert_eq!(mappings.author.as_ref().unwrap().source, "dc_creator");
        assert_eq!(mappings.category.as_ref().unwrap().source, "category");
        assert!(mappings.image.is_none());
    }

    #[test]
    fn test_mapping_carries_sample() {
        let analysis = result_with(
            &[("title", 100.0)],
            &[("title", FieldValue::Text("First".to_string()))],
        );
        let best = find_best_field(&analysis, &["title"], 90.0).unwrap();
        assert_eq!(best.sample.as_ref().and_then(FieldValue::as_text), Some("First"));
    }

    #[test]
    fn test_parsing_instructions_complete_mapping() {
        let m = |source: &str| {
            Some(FieldMapping {
                source: source.to_string(),
                reliability: 100.0,
                sample: None,
            })
        };
        let mappings = RecommendedMappings {
            title: m("title"),
            link: m("link"),
            description: m("description"),
            content: m("content_encoded"),
            date: m("pubDate"),
            image: m("media_content"),
            author: m("dc_creator"),
            category: m("category"),
        };
        let instructions = parsing_instructions(&mappings).unwrap();
        assert_eq!(instructions.title, "item.title");
        assert_eq!(instructions.image.as_deref(), Some("item.media_content.url"));
        assert_eq!(instructions.content.as_deref(), Some("item.content_encoded"));
    }

    #[test]
    fn test_parsing_instructions_image_branches() {
        let base = RecommendedMappings {
            title: Some(FieldMapping {
                source: "title".to_string(),
                reliability: 100.0,
                sample: None,
            }),
            link: Some(FieldMapping {
                source: "link".to_string(),
                reliability: 100.0,
                sample: None,
            }),
            ..Default::default()
        };
        for (source, expected) in [
            ("enclosure", "item.enclosure.url"),
            ("extracted_images", "item.extracted_images[0].src"),
            ("itunes_image", "item.itunes_image"),
        ] {
            let mappings = RecommendedMappings {
                image: Some(FieldMapping {
                    source: source.to_string(),
                    reliability: 60.0,
                    sample: None,
                }),
                ..base.clone()
            };
            let instructions = parsing_instructions(&mappings).unwrap();
            assert_eq!(instructions.image.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_parsing_instructions_missing_required_slot_fails() {
        let mappings = RecommendedMappings {
            link: Some(FieldMapping {
                source: "link".to_string(),
                reliability: 100.0,
                sample: None,
            }),
            ..Default::default()
        };
        let err = parsing_instructions(&mappings).unwrap_err();
        assert!(matches!(err, InstructionError::MissingSlot("title")));
    }

    #[test]
    fn test_parsing_instructions_optional_slots_null() {
        let mappings = RecommendedMappings {
            title: Some(FieldMapping {
                source: "title".to_string(),
                reliability: 100.0,
                sample: None,
            }),
            link: Some(FieldMapping {
                source: "link".to_string(),
                reliability: 100.0,
                sample: None,
            }),
            ..Default::default()
        };
        let instructions = parsing_instructions(&mappings).unwrap();
        assert!(instructions.date.is_none());
        assert!(instructions.image.is_none());
    }
}
