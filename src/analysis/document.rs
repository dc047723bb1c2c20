//! Structural parser: raw feed text to a navigable element tree.
//!
//! The tree is deliberately small and owned — no namespace resolution, no
//! DTD handling, no external entities. It is the substrate for heuristic
//! field extraction, not a conformant XML model. A structurally broken
//! document is a [`ParseError`]; a well-formed document with zero items is
//! not (that distinction is reported by the quality validator instead).

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors produced while building the element tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not well-formed markup (mismatched or unclosed tags,
    /// broken attribute syntax, invalid escapes).
    #[error("malformed XML: {0}")]
    Malformed(String),
    /// The input contained no element at all (empty string, plain text).
    #[error("document has no root element")]
    NoRoot,
}

/// One element in the parsed tree.
///
/// `name` is the raw tag name as written, prefix included (`dc:creator`).
/// `text` is the concatenation of text and CDATA nodes directly under this
/// element; callers trim it at the point of use.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Tag name with any namespace prefix stripped (`dc:creator` → `creator`).
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Value of an attribute by exact name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child whose full or local name equals `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.name == name || c.local_name() == name)
    }

    /// First descendant (depth-first, document order) whose full name equals
    /// `name`. Used for namespaced selectors like `media:content`, which may
    /// sit below an intermediate group element.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendant leaf elements (no child elements), document order.
    pub fn leaves(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Trimmed text content.
    pub fn text_trimmed(&self) -> &str {
        self.text.trim()
    }
}

fn collect_leaves<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        if child.children.is_empty() {
            out.push(child);
        } else {
            collect_leaves(child, out);
        }
    }
}

/// A parsed feed document: root element plus the two document-level facts
/// the analyzer reports on (declared encoding, declared namespace prefixes).
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
    /// Declared encoding, lowercased; `utf-8` when the declaration is absent.
    pub encoding: String,
    /// Namespace prefixes declared anywhere in the document (`xmlns:<prefix>`),
    /// deduplicated and sorted.
    pub namespaces: Vec<String>,
}

/// Parses raw feed text into a [`Document`].
///
/// Input is treated as text; bytes have already been decoded by the caller.
/// Any structural defect — mismatched tags, unclosed elements at EOF, broken
/// attributes — yields [`ParseError::Malformed`] with the parser diagnostic.
///
/// # Errors
///
/// [`ParseError::Malformed`] for non-well-formed markup,
/// [`ParseError::NoRoot`] when no element was found at all.
pub fn parse_document(raw: &str) -> Result<Document, ParseError> {
    // Text is kept raw and trimmed at the point of use; trimming per event
    // would eat interior whitespace around CDATA boundaries.
    let mut reader = Reader::from_str(raw);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut encoding = String::from("utf-8");
    let mut namespaces: BTreeSet<String> = BTreeSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Decl(decl)) => {
                if let Some(Ok(enc)) = decl.encoding() {
                    encoding = String::from_utf8_lossy(&enc).to_lowercase();
                }
            }
            Ok(Event::Start(start)) => {
                let el = element_from_tag(
                    &String::from_utf8_lossy(start.name().as_ref()),
                    start.attributes().flatten().map(|a| {
                        (
                            String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                            a.unescape_value()
                                .map(|v| v.into_owned())
                                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned()),
                        )
                    }),
                    &mut namespaces,
                );
                stack.push(el);
            }
            Ok(Event::Empty(empty)) => {
                let el = element_from_tag(
                    &String::from_utf8_lossy(empty.name().as_ref()),
                    empty.attributes().flatten().map(|a| {
                        (
                            String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                            a.unescape_value()
                                .map(|v| v.into_owned())
                                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned()),
                        )
                    }),
                    &mut namespaces,
                );
                attach(el, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".into()))?;
                attach(el, &mut stack, &mut root)?;
            }
            Ok(Event::Text(text)) => {
                let piece = text
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&piece);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(top) = stack.last_mut() {
                    top.text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    let root = root.ok_or(ParseError::NoRoot)?;
    Ok(Document {
        root,
        encoding,
        namespaces: namespaces.into_iter().collect(),
    })
}

/// Builds an element from tag name + attributes, harvesting `xmlns:` prefixes.
fn element_from_tag(
    name: &str,
    attrs: impl Iterator<Item = (String, String)>,
    namespaces: &mut BTreeSet<String>,
) -> Element {
    let attributes: Vec<(String, String)> = attrs.collect();
    for (key, _) in &attributes {
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            if !prefix.is_empty() {
                namespaces.insert(prefix.to_string());
            }
        }
    }
    Element {
        name: name.to_string(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    }
}

/// Attaches a completed element to its parent, or installs it as the root.
fn attach(
    el: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Malformed("multiple root elements".into()));
    }
    *root = Some(el);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rss_tree() {
        let doc = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Blog</title><item><title>Post</title></item></channel></rss>"#,
        )
        .unwrap();

        assert_eq!(doc.root.name, "rss");
        assert_eq!(doc.root.attr("version"), Some("2.0"));
        let channel = doc.root.child("channel").unwrap();
        assert_eq!(channel.child("title").unwrap().text_trimmed(), "Blog");
        let item = channel.child("item").unwrap();
        assert_eq!(item.child("title").unwrap().text_trimmed(), "Post");
    }

    #[test]
    fn test_parse_captures_encoding_lowercased() {
        let doc =
            parse_document(r#"<?xml version="1.0" encoding="ISO-8859-1"?><rss></rss>"#).unwrap();
        assert_eq!(doc.encoding, "iso-8859-1");
    }

    #[test]
    fn test_parse_missing_declaration_defaults_utf8() {
        let doc = parse_document("<rss><channel/></rss>").unwrap();
        assert_eq!(doc.encoding, "utf-8");
    }

    #[test]
    fn test_parse_collects_namespace_prefixes() {
        let doc = parse_document(
            r#"<rss xmlns:dc="http://purl.org/dc/elements/1.1/"
                 xmlns:media="http://search.yahoo.com/mrss/"><channel/></rss>"#,
        )
        .unwrap();
        assert_eq!(doc.namespaces, vec!["dc".to_string(), "media".to_string()]);
    }

    #[test]
    fn test_parse_cdata_text() {
        let doc = parse_document(
            "<rss><channel><description><![CDATA[<p>Hello</p>]]></description></channel></rss>",
        )
        .unwrap();
        let desc = doc.root.child("channel").unwrap().child("description").unwrap();
        assert_eq!(desc.text_trimmed(), "<p>Hello</p>");
    }

    #[test]
    fn test_parse_unclosed_element_is_malformed() {
        let result = parse_document("<rss><channel><item>");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_parse_mismatched_tags_is_malformed() {
        let result = parse_document("<rss><channel></item></rss>");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_parse_plain_text_has_no_root() {
        assert!(matches!(parse_document("just some text"), Err(ParseError::NoRoot)));
        assert!(matches!(parse_document(""), Err(ParseError::NoRoot)));
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let doc = parse_document(
            r#"<rss xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:creator>Ann</dc:creator></rss>"#,
        )
        .unwrap();
        let creator = &doc.root.children[0];
        assert_eq!(creator.name, "dc:creator");
        assert_eq!(creator.local_name(), "creator");
    }

    #[test]
    fn test_descendant_finds_nested_element() {
        let doc = parse_document(
            "<item><media:group><media:content url=\"https://x/a.jpg\"/></media:group></item>",
        )
        .unwrap();
        let content = doc.root.descendant("media:content").unwrap();
        assert_eq!(content.attr("url"), Some("https://x/a.jpg"));
    }

    #[test]
    fn test_leaves_are_document_order() {
        let doc =
            parse_document("<item><a>1</a><b><c>2</c></b><d>3</d></item>").unwrap();
        let names: Vec<&str> = doc.root.leaves().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_text_entities_resolved() {
        let doc = parse_document("<item><title>Cats &amp; Dogs &#233;</title></item>").unwrap();
        assert_eq!(
            doc.root.child("title").unwrap().text_trimmed(),
            "Cats & Dogs \u{e9}"
        );
    }

    #[test]
    fn test_attribute_entities_unescaped() {
        let doc = parse_document(r#"<item><link href="https://x/?a=1&amp;b=2"/></item>"#).unwrap();
        assert_eq!(
            doc.root.children[0].attr("href"),
            Some("https://x/?a=1&b=2")
        );
    }
}
