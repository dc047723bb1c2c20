//! Feed-type detection and channel-level metadata extraction.

use crate::analysis::document::{Document, Element};
use serde::Serialize;

/// The closed set of feed dialects the analyzer distinguishes.
///
/// Detection never fails: anything that is not recognizably RSS or Atom is
/// [`FeedType::Unknown`], which flows through analysis and is surfaced by the
/// compatibility checker rather than raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    Rss1,
    Rss2,
    Atom,
    Unknown,
}

/// Outcome of root-element detection: the dialect plus the declared version
/// for `rss` roots (`version` attribute, defaulting to "2.0").
#[derive(Debug, Clone)]
pub struct Detection {
    pub feed_type: FeedType,
    pub version: Option<String>,
}

/// Classifies a document by its root element's local name.
///
/// Tie-break order: `rss` beats `feed` (Atom) beats `RDF` (RSS 1.0); anything
/// else is Unknown. RSS 0.9x feeds still carry an `rss` root and classify as
/// [`FeedType::Rss2`] with their declared version preserved.
pub fn detect(doc: &Document) -> Detection {
    match doc.root.local_name() {
        "rss" => Detection {
            feed_type: FeedType::Rss2,
            version: Some(
                doc.root
                    .attr("version")
                    .unwrap_or("2.0")
                    .to_string(),
            ),
        },
        "feed" => Detection {
            feed_type: FeedType::Atom,
            version: None,
        },
        "RDF" => Detection {
            feed_type: FeedType::Rss1,
            version: None,
        },
        _ => Detection {
            feed_type: FeedType::Unknown,
            version: None,
        },
    }
}

/// Channel-level metadata, populated once from the document root and
/// read-only thereafter. Absent elements stay `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub id: Option<String>,
}

/// Extracts channel metadata for the detected dialect.
///
/// RSS (1.0 and 2.0) reads the `channel` child of the root; Atom reads the
/// `feed` root directly, mapping `subtitle` to description and preferring an
/// `href` attribute on `link`. Unknown dialects fall back to the RSS shape,
/// which degrades to an all-`None` result when nothing matches.
pub fn channel_info(doc: &Document, feed_type: FeedType) -> ChannelInfo {
    match feed_type {
        FeedType::Atom => atom_channel(&doc.root),
        _ => rss_channel(&doc.root),
    }
}

fn rss_channel(root: &Element) -> ChannelInfo {
    let channel = match root.child("channel") {
        Some(ch) => ch,
        None => return ChannelInfo::default(),
    };
    ChannelInfo {
        title: child_text(channel, "title"),
        description: child_text(channel, "description"),
        link: child_text(channel, "link"),
        language: child_text(channel, "language"),
        published: child_text(channel, "pubDate"),
        updated: child_text(channel, "lastBuildDate"),
        id: None,
    }
}

fn atom_channel(root: &Element) -> ChannelInfo {
    let link = root.child("link").and_then(|l| {
        l.attr("href")
            .map(str::to_string)
            .or_else(|| non_empty(l.text_trimmed()))
    });
    ChannelInfo {
        title: child_text(root, "title"),
        description: child_text(root, "subtitle"),
        link,
        language: None,
        published: None,
        updated: child_text(root, "updated"),
        id: child_text(root, "id"),
    }
}

fn child_text(el: &Element, name: &str) -> Option<String> {
    el.child(name).and_then(|c| non_empty(c.text_trimmed()))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::document::parse_document;

    #[test]
    fn test_detect_rss2() {
        let doc = parse_document(r#"<rss version="2.0"><channel/></rss>"#).unwrap();
        let d = detect(&doc);
        assert_eq!(d.feed_type, FeedType::Rss2);
        assert_eq!(d.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_detect_rss_version_defaults() {
        let doc = parse_document("<rss><channel/></rss>").unwrap();
        assert_eq!(detect(&doc).version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_detect_rss_091_still_rss2_family() {
        let doc = parse_document(r#"<rss version="0.91"><channel/></rss>"#).unwrap();
        let d = detect(&doc);
        assert_eq!(d.feed_type, FeedType::Rss2);
        assert_eq!(d.version.as_deref(), Some("0.91"));
    }

    #[test]
    fn test_detect_atom() {
        let doc =
            parse_document(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title></feed>"#)
                .unwrap();
        assert_eq!(detect(&doc).feed_type, FeedType::Atom);
    }

    #[test]
    fn test_detect_rss1_rdf_root() {
        let doc = parse_document(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><channel/></rdf:RDF>"#,
        )
        .unwrap();
        assert_eq!(detect(&doc).feed_type, FeedType::Rss1);
    }

    #[test]
    fn test_detect_unknown_root() {
        let doc = parse_document("<html><body/></html>").unwrap();
        assert_eq!(detect(&doc).feed_type, FeedType::Unknown);
    }

    #[test]
    fn test_rss_channel_metadata() {
        let doc = parse_document(
            r#"<rss version="2.0"><channel>
                <title>Example Blog</title>
                <link>https://example.com</link>
                <description>Things</description>
                <language>en-us</language>
                <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
                <lastBuildDate>Tue, 02 Jan 2024 00:00:00 GMT</lastBuildDate>
            </channel></rss>"#,
        )
        .unwrap();
        let info = channel_info(&doc, FeedType::Rss2);
        assert_eq!(info.title.as_deref(), Some("Example Blog"));
        assert_eq!(info.link.as_deref(), Some("https://example.com"));
        assert_eq!(info.description.as_deref(), Some("Things"));
        assert_eq!(info.language.as_deref(), Some("en-us"));
        assert!(info.published.is_some());
        assert!(info.updated.is_some());
        assert!(info.id.is_none());
    }

    #[test]
    fn test_atom_channel_metadata_link_href() {
        let doc = parse_document(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
                <title>Example</title>
                <subtitle>Things</subtitle>
                <link href="https://example.com" rel="alternate"/>
                <id>urn:uuid:1234</id>
                <updated>2024-01-01T00:00:00Z</updated>
            </feed>"#,
        )
        .unwrap();
        let info = channel_info(&doc, FeedType::Atom);
        assert_eq!(info.title.as_deref(), Some("Example"));
        assert_eq!(info.description.as_deref(), Some("Things"));
        assert_eq!(info.link.as_deref(), Some("https://example.com"));
        assert_eq!(info.id.as_deref(), Some("urn:uuid:1234"));
    }

    #[test]
    fn test_channel_missing_everything_is_all_none() {
        let doc = parse_document("<rss><channel/></rss>").unwrap();
        let info = channel_info(&doc, FeedType::Rss2);
        assert!(info.title.is_none());
        assert!(info.description.is_none());
        assert!(info.link.is_none());
    }
}
