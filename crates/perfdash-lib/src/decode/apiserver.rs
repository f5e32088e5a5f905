//! Scraped apiserver request counters
//!
//! The input is a metrics collection dumped by the e2e framework. Only the
//! `apiserver_request_count` series under `ApiServerMetrics` is consumed.

use super::DecodeCall;
use crate::models::{BuildData, DataItem, FORCED_VERSION, REQUEST_COUNT_KEY};
use crate::report::{DecodeError, DecodeReport};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Series consumed by this decoder
pub const REQUEST_COUNT_SERIES: &str = "apiserver_request_count";

const API_SERVER_METRICS: &str = "ApiServerMetrics";

/// Labels that identify the series rather than the sample
const RESERVED_LABELS: &[&str] = &["__name__", "contentType"];

#[derive(Debug, Deserialize)]
struct MetricsCollection {
    #[serde(rename = "ApiServerMetrics", default)]
    api_server_metrics: Option<BTreeMap<String, Vec<Sample>>>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    #[serde(default)]
    value: Value,
}

/// Decode the apiserver request count series of a metrics collection
///
/// Always stamps the aggregate's version as "v1". A collection without the
/// series is logged and skipped.
pub fn decode_apiserver_request_count(
    data: &[u8],
    build_number: u64,
    result: &mut BuildData,
) -> DecodeReport {
    result.version = FORCED_VERSION.to_string();
    let mut call = DecodeCall::new("apiserver_request_count", build_number);

    let collection: MetricsCollection = match serde_json::from_slice(data) {
        Ok(collection) => collection,
        Err(e) => return call.skip_build(e.into()),
    };

    let Some(mut metrics) = collection.api_server_metrics else {
        return call.skip_build(DecodeError::MissingMetricsCollection(API_SERVER_METRICS));
    };

    let Some(series) = metrics.remove(REQUEST_COUNT_SERIES) else {
        return call.skip_build(DecodeError::MissingSeries(REQUEST_COUNT_SERIES.to_string()));
    };

    for (index, sample) in series.into_iter().enumerate() {
        let count = match sample_value(&sample.value) {
            Ok(count) => count,
            Err(reason) => {
                call.skip_item(index, reason);
                continue;
            }
        };

        let mut item = DataItem::new("").with_data(REQUEST_COUNT_KEY, count);
        item.labels = sample.metric;
        for key in RESERVED_LABELS {
            item.labels.remove(*key);
        }

        call.append(result, item);
    }

    call.finish()
}

/// Read a sample value
///
/// Accepts a bare number, a numeric string, or the Prometheus
/// `[timestamp, "value"]` pair.
fn sample_value(value: &Value) -> Result<f64, DecodeError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DecodeError::InvalidSampleValue(n.to_string())),
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DecodeError::InvalidSampleValue(s.clone())),
        Value::Array(pair) if pair.len() == 2 => sample_value(&pair[1]),
        other => Err(DecodeError::InvalidSampleValue(other.to_string())),
    }
}
