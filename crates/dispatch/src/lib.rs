//! Resilient message dispatch with adaptive backoff.
//!
//! [`batch::Dispatcher`] walks a batch of pending deliveries one recipient at
//! a time, pacing sends with a per-batch backoff that decays on success and
//! grows on failure, and quarantining recipients whose delivery fails.
//! The backoff itself is a pure policy in [`backoff`]; all sleeping and
//! directory writes happen in the batch loop.

pub mod backoff;
pub mod batch;
pub mod error;

pub use {
    backoff::{BackoffPolicy, BackoffState, SendOutcome},
    batch::{Dispatcher, StatusReplyFn},
    error::{Error, Result},
};
