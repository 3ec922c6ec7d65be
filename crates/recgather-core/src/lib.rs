//! Domain layer for recgather.
//!
//! A record query sent to a device is answered by many reply fragments that
//! arrive independently and in any order. This crate holds the types shared by
//! every layer: the decoded fragment and record model, the store and notifier
//! contracts the aggregator depends on, configuration, and the error type.

pub mod config;
pub mod error;
pub mod fragment;
pub mod notifier;
pub mod record;
pub mod store;

// Re-export common types
pub use config::AggregatorConfig;
pub use error::{RecgatherError, Result};
pub use fragment::{CorrelationKey, Fragment, RawFragment, RawRecordItem};
pub use notifier::{CompletionNotifier, PendingResult};
pub use record::{ProgressEvent, RecordInfo, RecordItem};
pub use store::{FragmentStore, SessionKeys};
