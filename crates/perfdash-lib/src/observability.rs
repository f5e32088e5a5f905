//! Diagnostic stream for the decoders
//!
//! Every decoder reports skips and results through a [`StructuredLogger`]
//! so the emitted events carry consistent fields regardless of format.

use crate::report::DecodeError;
use tracing::{debug, info, warn};

/// Structured logger for decoder events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    decoder: &'static str,
}

impl StructuredLogger {
    pub fn new(decoder: &'static str) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &'static str {
        self.decoder
    }

    /// Log a payload that contributed nothing
    pub fn log_build_skipped(&self, build: &str, reason: &DecodeError) {
        warn!(
            event = "build_skipped",
            decoder = self.decoder,
            build = %build,
            error = %reason,
            "Skipping build"
        );
    }

    /// Log a single dropped item
    pub fn log_item_skipped(&self, build: &str, index: usize, reason: &DecodeError) {
        warn!(
            event = "item_skipped",
            decoder = self.decoder,
            build = %build,
            item = index,
            error = %reason,
            "Skipping data item"
        );
    }

    /// Trace-only: a build with another schema version is dropped without a warning
    pub fn log_version_mismatch(&self, build: &str, expected: &str, found: &str) {
        debug!(
            event = "version_mismatch",
            decoder = self.decoder,
            build = %build,
            expected = %expected,
            found = %found,
            "Dropping build with different schema version"
        );
    }

    /// Log the result of a decoder call
    pub fn log_build_decoded(&self, build: &str, appended: usize, skipped: usize) {
        if skipped > 0 {
            info!(
                event = "build_decoded",
                decoder = self.decoder,
                build = %build,
                appended = appended,
                skipped = skipped,
                "Decoded build with skipped items"
            );
        } else {
            debug!(
                event = "build_decoded",
                decoder = self.decoder,
                build = %build,
                appended = appended,
                "Decoded build"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("perf_data");
        assert_eq!(logger.decoder(), "perf_data");

        // No subscriber installed; calls must still be safe
        logger.log_build_skipped("1", &DecodeError::MissingCountLabel);
        logger.log_item_skipped("1", 3, &DecodeError::MissingCountLabel);
        logger.log_version_mismatch("1", "v1", "v2");
        logger.log_build_decoded("1", 4, 1);
    }
}
