//! Version-gated decoders for the generic `{version, dataItems}` shape

use super::DecodeCall;
use crate::models::{BuildData, DataItem, PerfData, COUNT_LABEL, REQUEST_COUNT_KEY};
use crate::report::{DecodeError, DecodeReport};

/// Decode a generic labeled performance document
///
/// The first document seen fixes the aggregate's version; documents with
/// any other version are dropped without a warning since their numbers are
/// not comparable. The `Count` label is metadata and is removed.
pub fn decode_perf_data(data: &[u8], build_number: u64, result: &mut BuildData) -> DecodeReport {
    decode_versioned("perf_data", data, build_number, result, |mut item| {
        strip_count(&mut item);
        Ok(item)
    })
}

/// Decode a document whose request count is carried in the `Count` label
///
/// Each item is rewritten to `{"RequestCount": Count}` with an empty unit.
/// Items without a parseable `Count` are skipped individually.
pub fn decode_request_count(
    data: &[u8],
    build_number: u64,
    result: &mut BuildData,
) -> DecodeReport {
    decode_versioned("request_count", data, build_number, result, |mut item| {
        into_request_count(&mut item)?;
        strip_count(&mut item);
        Ok(item)
    })
}

fn decode_versioned<F>(
    decoder: &'static str,
    data: &[u8],
    build_number: u64,
    result: &mut BuildData,
    mut convert: F,
) -> DecodeReport
where
    F: FnMut(DataItem) -> Result<DataItem, DecodeError>,
{
    let mut call = DecodeCall::new(decoder, build_number);

    let doc: PerfData = match serde_json::from_slice(data) {
        Ok(doc) => doc,
        Err(e) => return call.skip_build(e.into()),
    };

    if !result.accept_version(&doc.version) {
        let expected = result.version.clone();
        return call.version_mismatch(&expected, &doc.version);
    }

    for (index, item) in doc.data_items.into_iter().enumerate() {
        match convert(item) {
            Ok(item) if item.data.is_empty() => call.skip_item(index, DecodeError::EmptyData),
            Ok(item) => call.append(result, item),
            Err(reason) => call.skip_item(index, reason),
        }
    }

    call.finish()
}

fn strip_count(item: &mut DataItem) {
    item.labels.remove(COUNT_LABEL);
}

fn into_request_count(item: &mut DataItem) -> Result<(), DecodeError> {
    let raw = item.labels.get(COUNT_LABEL).ok_or(DecodeError::MissingCountLabel)?;
    let count = raw
        .parse::<f64>()
        .ok()
        .filter(|count| count.is_finite())
        .ok_or_else(|| DecodeError::InvalidCount(raw.clone()))?;

    item.unit.clear();
    item.data.clear();
    item.data.insert(REQUEST_COUNT_KEY.to_string(), count);
    Ok(())
}
