//! Format decoders
//!
//! Each decoder takes the raw bytes of one artifact, the build number it came
//! from and the shared aggregate, and appends what it can extract. Malformed
//! payloads are logged and skipped; no decoder returns an error to the caller.
//!
//! Supported shapes:
//! - generic labeled performance data (`decode_perf_data`)
//! - request counts carried in a `Count` label (`decode_request_count`)
//! - resource usage percentile summaries (`decode_resource_usage`)
//! - scraped apiserver request counters (`decode_apiserver_request_count`)

mod apiserver;
mod perf_data;
mod resource_usage;


pub use apiserver::{decode_apiserver_request_count, REQUEST_COUNT_SERIES};
pub use perf_data::{decode_perf_data, decode_request_count};
pub use resource_usage::{
    decode_resource_usage, decode_resource_usage_with, merge_percentiles, ResourceUsage,
    ResourceUsagePercentiles, ResourceUsageSample,
};

use crate::models::{BuildData, DataItem};
use crate::observability::StructuredLogger;
use crate::report::{DecodeError, DecodeReport, SkipScope};

/// Format a build number as an aggregate key
pub fn build_key(build_number: u64) -> String {
    build_number.to_string()
}

/// Bookkeeping for one decoder invocation
///
/// Keeps the log stream and the returned report in step.
struct DecodeCall {
    logger: StructuredLogger,
    report: DecodeReport,
}

impl DecodeCall {
    fn new(decoder: &'static str, build_number: u64) -> Self {
        Self {
            logger: StructuredLogger::new(decoder),
            report: DecodeReport::new(build_key(build_number)),
        }
    }

    fn build(&self) -> &str {
        &self.report.build
    }

    fn skip_build(mut self, reason: DecodeError) -> DecodeReport {
        self.logger.log_build_skipped(self.build(), &reason);
        self.report.skipped(SkipScope::Build, reason);
        self.report
    }

    fn skip_item(&mut self, index: usize, reason: DecodeError) {
        self.logger.log_item_skipped(self.build(), index, &reason);
        self.report.skipped(SkipScope::Item(index), reason);
    }

    fn version_mismatch(mut self, expected: &str, found: &str) -> DecodeReport {
        self.logger.log_version_mismatch(self.build(), expected, found);
        self.report.version_mismatch = true;
        self.report
    }

    fn append(&mut self, result: &mut BuildData, item: DataItem) {
        result.append(&self.report.build, item);
        self.report.appended();
    }

    fn finish(self) -> DecodeReport {
        let appended = self.report.appended_count();
        let skipped = self.report.skips().count();
        self.logger.log_build_decoded(self.build(), appended, skipped);
        self.report
    }
}
