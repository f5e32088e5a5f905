//! Performance artifact ingestion for perfdash
//!
//! This crate provides the core functionality for:
//! - Decoding performance test artifacts into a common `DataItem` shape
//! - Version gating across builds
//! - Merging resource usage samples of the same entity
//! - Normalizing generated entity names
//! - Structured diagnostics for skipped builds and items

pub mod artifact;
pub mod decode;
pub mod models;
pub mod normalize;
pub mod observability;
pub mod report;

pub use artifact::{ArtifactKind, ArtifactRules};
pub use decode::{
    decode_apiserver_request_count, decode_perf_data, decode_request_count,
    decode_resource_usage, decode_resource_usage_with,
};
pub use models::*;
pub use normalize::{DisambiguationRules, NameNormalizer, SuffixRule};
pub use observability::StructuredLogger;
pub use report::{DecodeError, DecodeReport, Outcome, SkipScope};
