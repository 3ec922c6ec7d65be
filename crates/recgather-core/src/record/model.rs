use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One recording entry reported by a device.
///
/// Built once while decoding a fragment and never mutated afterwards. The
/// serialized form (camelCase JSON) is what the fragment store keeps in a
/// session's item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordItem {
    /// Identifier of the device owning the recording. Blank when the device
    /// sent an empty `DeviceID` element.
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Storage location of the recording on the device
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    /// Free-text location of the recording
    #[serde(default)]
    pub address: Option<String>,
    /// Start of the recording, `yyyy-MM-dd HH:mm:ss`
    pub start_time: String,
    /// End of the recording, `yyyy-MM-dd HH:mm:ss`
    pub end_time: String,
    /// 0 = public, 1 = secret
    #[serde(default)]
    pub secrecy: i32,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub recorder_id: Option<String>,
}

impl RecordItem {
    /// Key collapsing items of a session that share the same time span.
    ///
    /// Two distinct recordings with identical start and end collapse to one
    /// stored entry.
    pub fn dedup_key(&self) -> String {
        format!("{}{}", self.start_time, self.end_time)
    }

    /// Orders items by start time, then end time.
    ///
    /// Both timestamps are normalized to `yyyy-MM-dd HH:mm:ss`, so the string
    /// comparison is chronological.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.end_time.cmp(&other.end_time))
    }

    /// Whether the owning device identifier is missing.
    pub fn has_owner(&self) -> bool {
        !self.device_id.trim().is_empty()
    }
}

/// Final, assembled answer to one record query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInfo {
    /// Device the query was sent to
    pub device_id: String,
    /// Channel whose recordings were queried
    pub channel_id: String,
    /// Dialog sequence tag of the query
    pub sn: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Total number of items the device declared
    pub sum_num: u32,
    /// Items received so far (pre-dedup)
    pub count: u64,
    /// Items in chronological order
    #[serde(default)]
    pub record_list: Vec<RecordItem>,
}

impl RecordInfo {
    /// Sorts the record list by [`RecordItem::chronological_cmp`].
    pub fn sort_records(&mut self) {
        self.record_list.sort_by(RecordItem::chronological_cmp);
    }
}

/// Partial progress after one fragment was merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub device_id: String,
    pub channel_id: String,
    pub sn: String,
    #[serde(default)]
    pub name: Option<String>,
    pub sum_num: u32,
    /// Items carried by this fragment
    pub delta_count: u64,
    /// Items received for the session so far, this fragment included
    pub running_count: u64,
    /// The items of this fragment, in arrival order
    #[serde(default)]
    pub items: Vec<RecordItem>,
}
