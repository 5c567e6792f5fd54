use {
    async_trait::async_trait,
    lagebot_common::types::{Attachment, RecipientId},
};

use crate::Result;

/// Whether a single send reached the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendReceipt {
    Delivered,
    /// The backend rejected or dropped the message for this recipient
    /// (blocked, departed, unregistered). The channel itself is still up.
    Rejected,
}

impl SendReceipt {
    #[must_use]
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Outbound send capability of one messaging backend.
///
/// Implementations may retry or time out internally; the caller treats the
/// returned receipt as a single opaque outcome. Safe to call repeatedly.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one message to one recipient.
    ///
    /// Returns `Err` only on total connection loss; an ordinary failed
    /// delivery is `Ok(SendReceipt::Rejected)`.
    async fn send(
        &self,
        recipient: &RecipientId,
        body: &str,
        attachments: &[Attachment],
    ) -> Result<SendReceipt>;
}

/// Process-control hook for the transport behind a [`MessageSink`].
///
/// The dispatcher asks for a restart after every send batch to reset the
/// connection; a failure here is logged by the caller, never escalated.
#[async_trait]
pub trait ServiceControl: Send + Sync {
    async fn restart_transport(&self) -> Result<()>;
}
