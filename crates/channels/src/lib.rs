//! Messaging-channel seam.
//!
//! The concrete messenger client (connect, send, receive) lives outside this
//! workspace; the dispatcher only sees the [`plugin::MessageSink`] and
//! [`plugin::ServiceControl`] traits defined here.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{MessageSink, SendReceipt, ServiceControl},
};
