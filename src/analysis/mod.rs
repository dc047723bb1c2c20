//! The schema-inference core: from raw feed text to a ranked mapping
//! recommendation.
//!
//! The pipeline is a straight line of pure stages:
//!
//! - [`document`] - structural parsing into a navigable element tree
//! - [`detect`] - feed-dialect classification and channel metadata
//! - [`extract`] - per-item field discovery (standard, namespaced, deep-scan)
//! - [`pattern`] - incremental per-field value classification
//! - [`aggregate`] - sampling loop and feed-wide reliability aggregation
//! - [`mapping`] - target-schema slot recommendation and parsing instructions
//! - [`validate`] - quality issues, warnings, and score
//! - [`compat`] - compatibility flags for downstream consumers
//!
//! Every stage is synchronous and side-effect-free; concurrent analyses share
//! nothing. The only async edge is the fetch collaborator in [`crate::fetch`].

mod aggregate;
mod compat;
mod detect;
mod document;
mod extract;
mod mapping;
mod pattern;
mod validate;

pub use aggregate::{analyze_content, AnalysisResult};
pub use compat::{check_compatibility, Compatibility};
pub use detect::{channel_info, detect, ChannelInfo, Detection, FeedType};
pub use document::{parse_document, Document, Element, ParseError};
pub use extract::{extract, FieldValue, ImageRef, ItemFields};
pub use mapping::{
    find_best_field, parsing_instructions, recommend, FieldMapping, InstructionError,
    ParsingInstructions, RecommendedMappings,
};
pub use pattern::{ContentFormat, FieldPattern};
pub use validate::{validate, Validation};
