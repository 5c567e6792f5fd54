//! Per-user delivery state: pending reports, enabled flags, answered
//! conversations.
//!
//! The storage layer behind [`store::UserDirectory`] is an external
//! collaborator; this crate ships the trait and the in-memory implementation
//! used by tests and single-process deployments.

pub mod error;
pub mod store;
pub mod store_memory;

pub use {
    error::{Error, Result},
    store::UserDirectory,
    store_memory::InMemoryDirectory,
};
