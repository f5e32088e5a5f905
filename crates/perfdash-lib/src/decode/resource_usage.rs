//! Resource usage percentile summaries
//!
//! Input is a map from percentile name ("Perc50", "Perc99", ...) to the raw
//! samples observed for every pod at that percentile. Samples whose names
//! normalize to the same entity are merged, and each entity is emitted as
//! one CPU item and one memory item carrying every percentile.

use super::DecodeCall;
use crate::models::{BuildData, DataItem, FORCED_VERSION};
use crate::normalize::{DisambiguationRules, NameNormalizer};
use crate::report::DecodeReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One raw sample as reported by the test framework
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageSample {
    #[serde(rename = "Name", default)]
    pub name: String,
    /// CPU usage in cores
    #[serde(rename = "Cpu", default)]
    pub cpu: f64,
    /// Memory usage in bytes
    #[serde(rename = "Mem", default)]
    pub memory: i64,
}

/// Raw summary: percentile -> samples
pub type ResourceUsagePercentiles = BTreeMap<String, Vec<ResourceUsageSample>>;

/// Reconciled reading for one entity at one percentile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub cpu: f64,
    /// Bytes
    pub memory: f64,
}

impl ResourceUsage {
    /// Independent maximum of each resource
    ///
    /// The result may pair a CPU value and a memory value that never appeared
    /// in the same raw sample. Taking each maximum separately is more stable
    /// across runs than picking one of the colliding samples.
    pub fn max(self, other: ResourceUsage) -> ResourceUsage {
        ResourceUsage {
            cpu: self.cpu.max(other.cpu),
            memory: self.memory.max(other.memory),
        }
    }
}

/// Collapse raw samples onto normalized names
///
/// Returns normalized name -> percentile -> merged reading.
pub fn merge_percentiles<N>(
    raw: &ResourceUsagePercentiles,
    normalizer: &N,
) -> BTreeMap<String, BTreeMap<String, ResourceUsage>>
where
    N: NameNormalizer + ?Sized,
{
    let mut usage: BTreeMap<String, BTreeMap<String, ResourceUsage>> = BTreeMap::new();

    for (percentile, samples) in raw {
        for sample in samples {
            let name = normalizer.normalize(&sample.name);
            let reading = ResourceUsage {
                cpu: sample.cpu,
                memory: sample.memory as f64,
            };

            usage
                .entry(name)
                .or_default()
                .entry(percentile.clone())
                .and_modify(|existing| *existing = existing.max(reading))
                .or_insert(reading);
        }
    }

    usage
}

/// Decode a resource usage summary with the default name rules
pub fn decode_resource_usage(
    data: &[u8],
    build_number: u64,
    result: &mut BuildData,
) -> DecodeReport {
    decode_resource_usage_with(data, build_number, result, &DisambiguationRules::default())
}

/// Decode a resource usage summary with a caller-supplied normalizer
///
/// This format carries no version; the aggregate's version is overwritten
/// with "v1" even if the payload turns out to be malformed.
pub fn decode_resource_usage_with<N>(
    data: &[u8],
    build_number: u64,
    result: &mut BuildData,
    normalizer: &N,
) -> DecodeReport
where
    N: NameNormalizer + ?Sized,
{
    result.version = FORCED_VERSION.to_string();
    let mut call = DecodeCall::new("resource_usage", build_number);

    let raw: ResourceUsagePercentiles = match serde_json::from_slice(data) {
        Ok(raw) => raw,
        Err(e) => return call.skip_build(e.into()),
    };

    for (pod_name, at_percentiles) in merge_percentiles(&raw, normalizer) {
        let mut cpu = DataItem::new("cores")
            .with_label("PodName", pod_name.as_str())
            .with_label("Resource", "CPU");
        let mut memory = DataItem::new("MiB")
            .with_label("PodName", pod_name.as_str())
            .with_label("Resource", "memory");

        for (percentile, usage) in at_percentiles {
            cpu.data.insert(percentile.clone(), usage.cpu);
            memory.data.insert(percentile, usage.memory / BYTES_PER_MIB);
        }

        call.append(result, cpu);
        call.append(result, memory);
    }

    call.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, cpu: f64, memory: i64) -> ResourceUsageSample {
        ResourceUsageSample {
            name: name.to_string(),
            cpu,
            memory,
        }
    }

    #[test]
    fn test_max_is_independent_per_resource() {
        let a = ResourceUsage { cpu: 1.0, memory: 500.0 };
        let b = ResourceUsage { cpu: 2.0, memory: 100.0 };
        assert_eq!(a.max(b), ResourceUsage { cpu: 2.0, memory: 500.0 });
        assert_eq!(b.max(a), ResourceUsage { cpu: 2.0, memory: 500.0 });
    }

    #[test]
    fn test_merge_percentiles_franken_sample() {
        let mut raw = ResourceUsagePercentiles::new();
        raw.insert(
            "Perc99".to_string(),
            vec![
                sample("kube-proxy-xkcdz", 1.0, 500),
                sample("kube-proxy-b2c4d", 2.0, 100),
            ],
        );
        raw.insert("Perc50".to_string(), vec![sample("kube-proxy-xkcdz", 0.5, 50)]);

        let merged = merge_percentiles(&raw, &DisambiguationRules::default());

        assert_eq!(merged.len(), 1);
        let proxy = &merged["kube-proxy"];
        assert_eq!(proxy["Perc99"], ResourceUsage { cpu: 2.0, memory: 500.0 });
        assert_eq!(proxy["Perc50"], ResourceUsage { cpu: 0.5, memory: 50.0 });
    }

    #[test]
    fn test_merge_percentiles_keeps_distinct_entities() {
        let mut raw = ResourceUsagePercentiles::new();
        raw.insert(
            "Perc90".to_string(),
            vec![sample("etcd-server", 0.3, 10), sample("kube-apiserver", 0.9, 20)],
        );

        let identity = |name: &str| name.to_string();
        let merged = merge_percentiles(&raw, &identity);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["etcd-server"]["Perc90"].cpu, 0.3);
        assert_eq!(merged["kube-apiserver"]["Perc90"].memory, 20.0);
    }

    #[test]
    fn test_sample_wire_names() {
        let raw: ResourceUsagePercentiles =
            serde_json::from_str(r#"{"Perc50":[{"Name":"heapster","Cpu":0.25,"Mem":2097152}]}"#)
                .unwrap();
        assert_eq!(raw["Perc50"][0], sample("heapster", 0.25, 2_097_152));
    }
}
