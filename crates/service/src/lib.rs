//! Periodic driver wiring the directory, dispatcher and resolver together.
//!
//! Two loops per channel, both sequential within it:
//! - [`reports::ReportService`] wakes on a timer and hands unconfirmed
//!   report deliveries to the dispatcher;
//! - [`mentions::MentionService`] polls mention events, resolves their text
//!   to a region and answers each conversation at most once.
//!
//! A recipient disabled by delivery failures is re-admitted only through
//! [`mentions::MentionService::note_inbound`], i.e. by a successful inbound
//! interaction.

pub mod config;
pub mod mentions;
pub mod reports;

pub use {
    config::ServiceConfig,
    mentions::{MentionRunReport, MentionService, MentionSource, RegionReplyFn},
    reports::ReportService,
};
