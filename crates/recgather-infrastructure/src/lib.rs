//! Infrastructure adapters for recgather.
//!
//! Concrete implementations of the contracts defined in `recgather-core`.

pub mod config_service;
pub mod memory_store;
pub mod pending_registry;

pub use crate::config_service::ConfigService;
pub use crate::memory_store::MemoryFragmentStore;
pub use crate::pending_registry::PendingQueryRegistry;
