//! Compatibility checking for downstream consumers: which feeds need custom
//! handling, and what post-processing the recommended mappings imply.

use crate::analysis::aggregate::AnalysisResult;
use crate::analysis::detect::FeedType;
use crate::analysis::mapping::RecommendedMappings;
use serde::Serialize;

/// Namespace prefixes the downstream pipeline handles natively.
const SUPPORTED_NAMESPACES: &[&str] = &["dc", "content", "media", "atom"];

/// A mapping below this reliability needs per-item fallback handling.
const WEAK_MAPPING_THRESHOLD: f64 = 50.0;

/// Compatibility verdict. `requires_processing` entries are blocking work
/// items for ingestion; `recommendations` are advisory.
#[derive(Debug, Clone, Serialize)]
pub struct Compatibility {
    pub is_compatible: bool,
    pub requires_processing: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Flags unsupported feed types, foreign namespaces, and weak mappings.
pub fn check_compatibility(
    analysis: &AnalysisResult,
    mappings: &RecommendedMappings,
) -> Compatibility {
    let mut requires_processing = Vec::new();
    let mut recommendations = Vec::new();
    let mut is_compatible = true;

    if analysis.feed_type == FeedType::Unknown {
        is_compatible = false;
        requires_processing
            .push("unknown feed type: custom extraction rules required".to_string());
    }

    for ns in &analysis.namespaces {
        if !SUPPORTED_NAMESPACES.contains(&ns.as_str()) {
            recommendations.push(format!(
                "namespace `{ns}` is not natively supported; its fields are only reachable via deep scan"
            ));
        }
    }

    for (slot, mapping) in mappings.slots() {
        let weak = match mapping {
            Some(m) => m.reliability < WEAK_MAPPING_THRESHOLD,
            None => true,
        };
        if weak {
            requires_processing.push(format!("slot `{slot}` has no reliable mapping"));
        }
    }

    for (field, pattern) in &analysis.patterns {
        if pattern.has_html && !html_expected(field, mappings) {
            recommendations.push(format!(
                "field `{field}` contains HTML markup; strip before display"
            ));
        }
    }

    Compatibility {
        is_compatible,
        requires_processing,
        recommendations,
    }
}

/// HTML is expected in the content/description slots (and the fields that
/// serve them); everywhere else it is a display hazard.
fn html_expected(field: &str, mappings: &RecommendedMappings) -> bool {
    if matches!(field, "content" | "content_encoded" | "description") {
        return true;
    }
    [&mappings.content, &mappings.description]
        .iter()
        .any(|slot| slot.as_ref().is_some_and(|m| m.source == field))
}
