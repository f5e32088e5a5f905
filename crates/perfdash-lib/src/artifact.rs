//! Artifact kinds and file naming conventions
//!
//! Test jobs write one JSON file per summary, named after the summary type
//! (`ResourceUsageSummary_density_2019-04-01T10:00:00Z.json`). The prefix
//! decides which decoder applies.

use crate::decode::{
    decode_apiserver_request_count, decode_perf_data, decode_request_count,
    decode_resource_usage_with,
};
use crate::models::BuildData;
use crate::normalize::{DisambiguationRules, NameNormalizer};
use crate::report::DecodeReport;
use serde::{Deserialize, Serialize};

/// Supported input shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Generic `{version, dataItems}` document
    PerfData,
    /// Generic document whose request count sits in the `Count` label
    RequestCount,
    /// Percentile resource usage summary
    ResourceUsage,
    /// Metrics collection with the apiserver request counter
    ApiserverRequestCount,
}

impl ArtifactKind {
    /// Classify a file name with the default prefixes
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        ArtifactRules::default().classify(file_name)
    }

    /// Run the matching decoder with the default name rules
    pub fn decode(self, data: &[u8], build_number: u64, result: &mut BuildData) -> DecodeReport {
        self.decode_with(data, build_number, result, &DisambiguationRules::default())
    }

    /// Run the matching decoder; `normalizer` only affects resource usage
    pub fn decode_with<N>(
        self,
        data: &[u8],
        build_number: u64,
        result: &mut BuildData,
        normalizer: &N,
    ) -> DecodeReport
    where
        N: NameNormalizer + ?Sized,
    {
        match self {
            ArtifactKind::PerfData => decode_perf_data(data, build_number, result),
            ArtifactKind::RequestCount => decode_request_count(data, build_number, result),
            ArtifactKind::ResourceUsage => {
                decode_resource_usage_with(data, build_number, result, normalizer)
            }
            ArtifactKind::ApiserverRequestCount => {
                decode_apiserver_request_count(data, build_number, result)
            }
        }
    }
}

/// Prefix table mapping file names to artifact kinds
#[derive(Debug, Clone)]
pub struct ArtifactRules {
    prefixes: Vec<(String, ArtifactKind)>,
}

impl Default for ArtifactRules {
    fn default() -> Self {
        let defaults = [
            ("ResourceUsageSummary", ArtifactKind::ResourceUsage),
            ("MetricsForE2E", ArtifactKind::ApiserverRequestCount),
            ("APIResponsiveness_RequestCount", ArtifactKind::RequestCount),
            ("RequestCount", ArtifactKind::RequestCount),
            ("APIResponsiveness", ArtifactKind::PerfData),
            ("PodStartupLatency", ArtifactKind::PerfData),
            ("SchedulingThroughput", ArtifactKind::PerfData),
            ("PerfData", ArtifactKind::PerfData),
        ];

        Self {
            prefixes: defaults
                .into_iter()
                .map(|(prefix, kind)| (prefix.to_string(), kind))
                .collect(),
        }
    }
}

impl ArtifactRules {
    /// A table with no prefixes at all
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Add or replace a prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>, kind: ArtifactKind) -> Self {
        let prefix = prefix.into();
        self.prefixes.retain(|(p, _)| *p != prefix);
        self.prefixes.push((prefix, kind));
        self
    }

    /// Classify a JSON artifact by its file name
    ///
    /// The longest matching prefix wins. Files that are not `.json` never match.
    pub fn classify(&self, file_name: &str) -> Option<ArtifactKind> {
        if !file_name.ends_with(".json") {
            return None;
        }

        self.prefixes
            .iter()
            .filter(|(prefix, _)| file_name.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, kind)| *kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let cases = [
            ("ResourceUsageSummary_load_2019-04-01T10:00:00Z.json", Some(ArtifactKind::ResourceUsage)),
            ("MetricsForE2E_density.json", Some(ArtifactKind::ApiserverRequestCount)),
            ("APIResponsiveness_density.json", Some(ArtifactKind::PerfData)),
            ("APIResponsiveness_RequestCount_density.json", Some(ArtifactKind::RequestCount)),
            ("PodStartupLatency_density.json", Some(ArtifactKind::PerfData)),
            ("build-log.txt", None),
            ("APIResponsiveness_density.txt", None),
            ("junit_01.json", None),
        ];

        for (name, expected) in cases {
            assert_eq!(ArtifactKind::from_file_name(name), expected, "{name}");
        }
    }

    #[test]
    fn test_custom_prefix_overrides() {
        let rules = ArtifactRules::default()
            .with_prefix("APIResponsiveness", ArtifactKind::RequestCount)
            .with_prefix("Custom", ArtifactKind::PerfData);

        assert_eq!(
            rules.classify("APIResponsiveness_load.json"),
            Some(ArtifactKind::RequestCount)
        );
        assert_eq!(rules.classify("Custom_x.json"), Some(ArtifactKind::PerfData));
        assert_eq!(ArtifactRules::empty().classify("PerfData.json"), None);
    }

    #[test]
    fn test_kind_deserializes_snake_case() {
        let kind: ArtifactKind = serde_json::from_str("\"apiserver_request_count\"").unwrap();
        assert_eq!(kind, ArtifactKind::ApiserverRequestCount);
    }

    #[test]
    fn test_dispatch_decodes() {
        let mut result = BuildData::new();
        let report = ArtifactKind::ResourceUsage.decode(
            br#"{"Perc50": [{"Name": "heapster-v1.6.0-5f4c9d7b8c-x2xkq", "Cpu": 0.1, "Mem": 1048576}]}"#,
            12,
            &mut result,
        );

        assert_eq!(report.appended_count(), 2);
        assert_eq!(result.items("12")[0].labels["PodName"], "heapster-v1.6.0");
    }
}
