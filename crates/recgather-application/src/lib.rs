//! Application layer for recgather.
//!
//! This crate provides the use cases that sit between the transport and the
//! infrastructure adapters: fragment aggregation, the worker pool fragments
//! are dispatched onto, and the reply handler the transport calls.

pub mod aggregator;
pub mod record_info_handler;
pub mod worker_pool;

pub use aggregator::FragmentAggregator;
pub use record_info_handler::{Acknowledger, RecordInfoHandler};
pub use worker_pool::WorkerPool;
