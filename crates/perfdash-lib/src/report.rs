//! Outcome reporting for decoder calls
//!
//! Decoders never fail the caller. Every skipped build or item is logged and
//! also recorded in a [`DecodeReport`] so callers and tests can inspect what
//! happened without scraping the log.

use thiserror::Error;

/// Reasons a build or an item was skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("data item carries no numeric data")]
    EmptyData,

    #[error("no 'Count' label")]
    MissingCountLabel,

    #[error("couldn't parse count: {0}")]
    InvalidCount(String),

    #[error("no {0} data")]
    MissingMetricsCollection(&'static str),

    #[error("no {0} metric data")]
    MissingSeries(String),

    #[error("sample value is not a number: {0}")]
    InvalidSampleValue(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::MalformedJson(err.to_string())
    }
}

/// Which part of a payload a skip applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipScope {
    /// The whole payload contributed nothing
    Build,
    /// Only the item at this index was dropped
    Item(usize),
}

/// Result of a single unit of work inside a decoder call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An item was appended to the build's sequence
    Appended,
    /// Something was dropped
    Skipped { scope: SkipScope, reason: DecodeError },
}

/// What a decoder call did to the aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReport {
    pub build: String,
    pub outcomes: Vec<Outcome>,
    /// The payload's version differed from the aggregate's and was dropped
    pub version_mismatch: bool,
}

impl DecodeReport {
    pub fn new(build: impl Into<String>) -> Self {
        Self {
            build: build.into(),
            outcomes: Vec::new(),
            version_mismatch: false,
        }
    }

    pub(crate) fn appended(&mut self) {
        self.outcomes.push(Outcome::Appended);
    }

    pub(crate) fn skipped(&mut self, scope: SkipScope, reason: DecodeError) {
        self.outcomes.push(Outcome::Skipped { scope, reason });
    }

    /// Number of items appended by this call
    pub fn appended_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Appended))
            .count()
    }

    /// All skips recorded by this call
    pub fn skips(&self) -> impl Iterator<Item = (SkipScope, &DecodeError)> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Skipped { scope, reason } => Some((*scope, reason)),
            Outcome::Appended => None,
        })
    }

    /// The build-level failure, if the whole payload was dropped
    pub fn build_error(&self) -> Option<&DecodeError> {
        self.skips()
            .find(|(scope, _)| *scope == SkipScope::Build)
            .map(|(_, reason)| reason)
    }

    /// True when nothing was skipped and the version matched
    pub fn is_clean(&self) -> bool {
        !self.version_mismatch && self.skips().next().is_none()
    }
}
