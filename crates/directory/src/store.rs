//! The `UserDirectory` trait: everything the dispatch engine and the mention
//! loop need to know about recipients and delivery state.

use {
    async_trait::async_trait,
    lagebot_common::types::{PendingDelivery, RecipientId, ReportKind},
};

use crate::Result;

/// Per-user delivery and conversation state.
///
/// Each recipient record is logically owned by exactly one channel task, but
/// implementations must still guarantee atomic per-record read-modify-write
/// so independent channel tasks can share one directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Deliveries of `kind` that have not been confirmed yet, in insertion
    /// order. Recipients that are currently disabled are excluded.
    async fn list_pending_deliveries(&self, kind: ReportKind) -> Result<Vec<PendingDelivery>>;

    /// Mark the pending delivery of `kind` for `recipient` as sent. A
    /// confirmed delivery never reappears in `list_pending_deliveries`.
    async fn confirm_delivery(&self, recipient: &RecipientId, kind: ReportKind) -> Result<()>;

    /// Exclude a recipient from future batches. Idempotent.
    async fn disable_recipient(&self, id: &RecipientId) -> Result<()>;

    /// Re-admit a recipient to future batches. Idempotent.
    async fn enable_recipient(&self, id: &RecipientId) -> Result<()>;

    async fn is_enabled(&self, id: &RecipientId) -> Result<bool>;

    /// Record an inbound interaction timestamp for the recipient.
    async fn touch_activity(&self, id: &RecipientId) -> Result<()>;

    /// Whether a reply attempt was already made for this conversation.
    async fn is_answered(&self, conversation_id: &str) -> Result<bool>;

    /// Record that a reply attempt was made. Idempotent.
    async fn set_answered(&self, conversation_id: &str) -> Result<()>;
}
