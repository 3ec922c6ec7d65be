//! Fragment domain module.
//!
//! A record query is answered by one or more independently delivered reply
//! packets (fragments). The transport layer parses each packet into a
//! string-typed [`RawFragment`]; [`Fragment::decode`] turns that into typed
//! fields and [`RecordItem`](crate::record::RecordItem)s.
//!
//! # Module Structure
//!
//! - `model`: `CorrelationKey`, `RawFragment`, `RawRecordItem`, `Fragment`
//! - `decode`: field decoding and timestamp normalization

mod decode;
mod model;

// Re-export public API
pub use decode::normalize_timestamp;
pub use model::{CorrelationKey, Fragment, RawFragment, RawRecordItem};
