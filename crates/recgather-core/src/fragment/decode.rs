//! Decoding of transport-delivered fragments.

use super::model::{CorrelationKey, Fragment, RawFragment, RawRecordItem};
use crate::error::{RecgatherError, Result};
use crate::record::RecordItem;
use chrono::{DateTime, NaiveDateTime};

const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted timestamp shapes, tried in order after RFC 3339.
const INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y%m%dT%H%M%S"];

/// Normalizes a device timestamp to `yyyy-MM-dd HH:mm:ss`.
///
/// Devices send ISO 8601 local times (`2024-05-01T08:00:00`), sometimes with
/// fractional seconds or a UTC offset. An offset is dropped, keeping the
/// wall-clock time the device reported.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local().format(OUTPUT_FORMAT).to_string());
    }

    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|parsed| parsed.format(OUTPUT_FORMAT).to_string())
}

impl Fragment {
    /// Decodes a raw fragment.
    ///
    /// # Errors
    ///
    /// Returns a `Decode` error when `SN` is missing, when `SumNum` or an
    /// item's `Secrecy` is not a number, or when an item timestamp cannot be
    /// parsed. The whole fragment is rejected in that case.
    pub fn decode(raw: RawFragment) -> Result<Self> {
        let sn = non_blank(raw.sn)
            .ok_or_else(|| RecgatherError::decode("SN", "missing dialog sequence tag"))?;
        let declared_total = parse_number::<u32>("SumNum", raw.sum_num.as_deref())?.unwrap_or(0);

        let has_record_list = raw.record_list.is_some();
        let items = raw
            .record_list
            .unwrap_or_default()
            .into_iter()
            .map(decode_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            key: CorrelationKey::new(raw.device, sn),
            channel_id: raw.channel_id.unwrap_or_default(),
            name: raw.name,
            declared_total,
            has_record_list,
            items,
        })
    }
}

fn decode_item(raw: RawRecordItem) -> Result<RecordItem> {
    let secrecy = parse_number::<i32>("Secrecy", raw.secrecy.as_deref())?.unwrap_or(0);

    Ok(RecordItem {
        device_id: raw.device_id.unwrap_or_default(),
        name: raw.name,
        file_path: raw.file_path,
        file_size: raw.file_size,
        address: raw.address,
        start_time: decode_timestamp("StartTime", raw.start_time.as_deref())?,
        end_time: decode_timestamp("EndTime", raw.end_time.as_deref())?,
        secrecy,
        record_type: raw.record_type,
        recorder_id: raw.recorder_id,
    })
}

fn decode_timestamp(field: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(text) => normalize_timestamp(text)
            .ok_or_else(|| RecgatherError::decode(field, format!("unrecognized timestamp '{}'", text))),
    }
}

/// Parses an optional numeric field; absent or blank yields `None`.
fn parse_number<T>(field: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|e| RecgatherError::decode(field, format!("'{}': {}", text, e))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
