//! In-memory directory backed by a single mutex. Used by tests and
//! single-process deployments; a persistent store slots in behind the same
//! trait.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    chrono::Utc,
    lagebot_common::types::{PendingDelivery, RecipientId, RecipientRecord, ReportKind},
};

use crate::{Result, store::UserDirectory};

#[derive(Default)]
struct Inner {
    recipients: HashMap<RecipientId, RecipientRecord>,
    // Insertion order per kind is the batch order the dispatcher sees.
    pending: HashMap<ReportKind, Vec<PendingDelivery>>,
    answered: HashSet<String>,
}

/// `Mutex<HashMap>`-backed [`UserDirectory`]. The single lock makes every
/// operation an atomic read-modify-write.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: Mutex<Inner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipient, enabled by default. Re-registering keeps the
    /// existing record.
    pub fn add_recipient(&self, id: impl Into<RecipientId>) {
        let id = id.into();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.recipients.entry(id.clone()).or_insert(RecipientRecord {
            id,
            enabled: true,
            last_activity: Utc::now(),
        });
    }

    /// Queue a delivery for a later batch. The recipient is registered if it
    /// is not known yet.
    pub fn enqueue_delivery(&self, kind: ReportKind, item: PendingDelivery) {
        self.add_recipient(item.recipient.clone());
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.pending.entry(kind).or_default().push(item);
    }

    pub fn recipient(&self, id: &RecipientId) -> Option<RecipientRecord> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.recipients.get(id).cloned()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn list_pending_deliveries(&self, kind: ReportKind) -> Result<Vec<PendingDelivery>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let items = inner
            .pending
            .get(&kind)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| {
                        inner
                            .recipients
                            .get(&item.recipient)
                            .is_none_or(|r| r.enabled)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }

    async fn confirm_delivery(&self, recipient: &RecipientId, kind: ReportKind) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(items) = inner.pending.get_mut(&kind) {
            items.retain(|item| &item.recipient != recipient);
        }
        Ok(())
    }

    async fn disable_recipient(&self, id: &RecipientId) -> Result<()> {
        self.set_enabled(id, false);
        Ok(())
    }

    async fn enable_recipient(&self, id: &RecipientId) -> Result<()> {
        self.set_enabled(id, true);
        Ok(())
    }

    async fn is_enabled(&self, id: &RecipientId) -> Result<bool> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.recipients.get(id).is_some_and(|r| r.enabled))
    }

    async fn touch_activity(&self, id: &RecipientId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = inner.recipients.get_mut(id) {
            record.last_activity = Utc::now();
        }
        Ok(())
    }

    async fn is_answered(&self, conversation_id: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.answered.contains(conversation_id))
    }

    async fn set_answered(&self, conversation_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.answered.insert(conversation_id.to_string());
        Ok(())
    }
}

impl InMemoryDirectory {
    fn set_enabled(&self, id: &RecipientId, enabled: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let record = inner
            .recipients
            .entry(id.clone())
            .or_insert_with(|| RecipientRecord {
                id: id.clone(),
                enabled,
                last_activity: Utc::now(),
            });
        record.enabled = enabled;
    }
}
