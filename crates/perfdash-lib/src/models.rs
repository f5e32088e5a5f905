//! Core data models for perfdash

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Label that producers attach as metadata; never kept as a dimension
pub const COUNT_LABEL: &str = "Count";

/// Data key used by the request-count decoders
pub const REQUEST_COUNT_KEY: &str = "RequestCount";

/// Version stamped by the decoders that do not carry their own
pub const FORCED_VERSION: &str = "v1";

/// A single normalized performance sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Unit of the values in `data`, e.g. "cores", "MiB", or empty for counts
    #[serde(default)]
    pub unit: String,
    /// Dimensions identifying this sample (pod name, resource, verb, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    /// Named numeric readings
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: BTreeMap<String, f64>,
}

impl DataItem {
    /// Create an item with the given unit and no labels or data
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Default::default()
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a data point
    pub fn with_data(mut self, key: impl Into<String>, value: f64) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Wire shape of a generic labeled performance document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerfData {
    /// Schema version of the document
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    /// Items in document order
    #[serde(rename = "dataItems", default, deserialize_with = "null_as_default")]
    pub data_items: Vec<DataItem>,
}

/// Producers write unset maps and slices as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// All DataItems of a report, keyed by build number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildData {
    /// Schema version shared by every build in the aggregate
    #[serde(default)]
    pub version: String,
    /// Build identifier (decimal build number) -> items in insertion order
    #[serde(default)]
    pub builds: BTreeMap<String, Vec<DataItem>>,
}

impl BuildData {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to a build's sequence
    pub fn append(&mut self, build: &str, item: DataItem) {
        self.builds.entry(build.to_string()).or_default().push(item);
    }

    /// Items recorded for a build, empty if the build is unknown
    pub fn items(&self, build: &str) -> &[DataItem] {
        self.builds.get(build).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of builds with at least one entry
    pub fn build_count(&self) -> usize {
        self.builds.len()
    }

    /// True when no build has any entry
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    /// Adopt `version` if none is set yet and report whether it matches
    pub(crate) fn accept_version(&mut self, version: &str) -> bool {
        if self.version.is_empty() {
            self.version = version.to_string();
        }
        self.version == version
    }

    /// Fold a partial aggregate into this one
    ///
    /// Items are appended per build in `other`'s order. Returns `false` and
    /// drops `other`'s items when both aggregates carry different versions.
    pub fn merge(&mut self, other: BuildData) -> bool {
        if !other.version.is_empty() && !self.accept_version(&other.version) {
            return false;
        }

        for (build, items) in other.builds {
            self.builds.entry(build).or_default().extend(items);
        }
        true
    }

    /// Keep only the `max_builds` most recent builds
    ///
    /// Builds are ordered by numeric build number; identifiers that are not
    /// numbers are treated as older than any numbered build.
    pub fn retain_latest(&mut self, max_builds: usize) {
        if self.builds.len() <= max_builds {
            return;
        }

        let mut keys: Vec<String> = self.builds.keys().cloned().collect();
        keys.sort_by_key(|k| build_sort_key(k));

        let excess = keys.len() - max_builds;
        for key in keys.into_iter().take(excess) {
            self.builds.remove(&key);
        }
    }
}

fn build_sort_key(build: &str) -> (bool, u64) {
    match build.parse::<u64>() {
        Ok(n) => (true, n),
        Err(_) => (false, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(value: f64) -> DataItem {
        DataItem::new("ms").with_data("Perc50", value)
    }

    #[test]
    fn test_append_preserves_order() {
        let mut data = BuildData::new();
        data.append("7", item(1.0));
        data.append("7", item(2.0));
        data.append("8", item(3.0));

        assert_eq!(data.build_count(), 2);
        let values: Vec<f64> = data.items("7").iter().map(|i| i.data["Perc50"]).collect();
        assert_eq!(values, vec![1.0, 2.0]);
        assert!(data.items("9").is_empty());
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let doc: PerfData = serde_json::from_str(
            r#"{"version":null,"dataItems":[{"data":null,"unit":"ms","labels":null}]}"#,
        )
        .unwrap();
        assert_eq!(doc.version, "");
        assert_eq!(doc.data_items, vec![DataItem::new("ms")]);

        let doc: PerfData = serde_json::from_str(r#"{"version":"v1","dataItems":null}"#).unwrap();
        assert!(doc.data_items.is_empty());
    }

    #[test]
    fn test_merge_adopts_version() {
        let mut data = BuildData::new();
        let mut partial = BuildData::new();
        partial.version = "v2".to_string();
        partial.append("1", item(1.0));

        assert!(data.merge(partial));
        assert_eq!(data.version, "v2");
        assert_eq!(data.items("1").len(), 1);
    }

    #[test]
    fn test_merge_rejects_other_version() {
        let mut data = BuildData::new();
        data.version = "v1".to_string();
        data.append("1", item(1.0));

        let mut partial = BuildData::new();
        partial.version = "v2".to_string();
        partial.append("1", item(2.0));
        partial.append("2", item(3.0));

        assert!(!data.merge(partial));
        assert_eq!(data.items("1").len(), 1);
        assert!(data.items("2").is_empty());
    }

    #[test]
    fn test_retain_latest_uses_numeric_order() {
        let mut data = BuildData::new();
        for build in ["9", "10", "100", "2", "latest"] {
            data.append(build, item(1.0));
        }

        data.retain_latest(3);

        let kept: Vec<&str> = data.builds.keys().map(String::as_str).collect();
        assert_eq!(kept, vec!["10", "100", "9"]);
    }

    #[test]
    fn test_perf_data_wire_names() {
        let json = r#"{"version":"v1","dataItems":[{"data":{"Perc99":1.5},"unit":"ms","labels":{"Verb":"GET"}}]}"#;
        let doc: PerfData = serde_json::from_str(json).unwrap();
        assert_eq!(doc.version, "v1");
        assert_eq!(doc.data_items.len(), 1);
        assert_eq!(doc.data_items[0].labels["Verb"], "GET");

        let out = serde_json::to_value(&doc.data_items[0]).unwrap();
        assert_eq!(out["unit"], "ms");
        assert_eq!(out["data"]["Perc99"], 1.5);
    }
}
