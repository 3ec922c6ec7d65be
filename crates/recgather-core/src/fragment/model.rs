use crate::record::RecordItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one record query across all of its fragments.
///
/// `device_id` is the device the query was sent to and `sn` the dialog
/// sequence tag the query carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    pub device_id: String,
    pub sn: String,
}

impl CorrelationKey {
    pub fn new(device_id: impl Into<String>, sn: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            sn: sn.into(),
        }
    }

    /// Builds a flat store or registry key: `<prefix><device_id><sn>`.
    pub fn with_prefix(&self, prefix: &str) -> String {
        format!("{}{}{}", prefix, self.device_id, self.sn)
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.sn)
    }
}

/// One record list entry as delivered by the transport, every field untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRecordItem {
    #[serde(rename = "DeviceID", default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub secrecy: Option<String>,
    #[serde(rename = "Type", default)]
    pub record_type: Option<String>,
    #[serde(rename = "RecorderID", default)]
    pub recorder_id: Option<String>,
}

/// One record query reply packet as delivered by the transport.
///
/// `device` comes from the signaling session (who sent the packet); the rest
/// mirrors the packet body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawFragment {
    pub device: String,
    /// Channel whose recordings are listed
    #[serde(rename = "DeviceID", default)]
    pub channel_id: Option<String>,
    #[serde(rename = "SN", default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sum_num: Option<String>,
    /// `None` when the packet carried no record list element at all
    #[serde(default)]
    pub record_list: Option<Vec<RawRecordItem>>,
}

/// A decoded reply packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub key: CorrelationKey,
    pub channel_id: String,
    pub name: Option<String>,
    /// Total number of items the device says the whole query holds.
    /// Every fragment repeats it.
    pub declared_total: u32,
    pub has_record_list: bool,
    /// Items in arrival order, owner-less ones included. An entry without a
    /// `DeviceID` element decodes with a blank `device_id`.
    pub items: Vec<RecordItem>,
}

impl Fragment {
    /// Whether the device signalled that it has nothing to report.
    pub fn is_empty_reply(&self) -> bool {
        self.declared_total == 0 || !self.has_record_list || self.items.is_empty()
    }
}
