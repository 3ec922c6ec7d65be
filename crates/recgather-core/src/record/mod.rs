//! Record domain module.
//!
//! A record query reply is made of `RecordItem`s. Items from every fragment of
//! one query are gathered into a `RecordInfo`, which is handed to the single
//! waiter of that query once aggregation completes. `ProgressEvent` reports the
//! partial state after each fragment.
//!
//! # Module Structure
//!
//! - `model`: `RecordItem`, `RecordInfo`, `ProgressEvent`

mod model;

// Re-export public API
pub use model::{ProgressEvent, RecordInfo, RecordItem};
