//! Core data model shared by the dispatch engine, resolver and driver.

use {
    chrono::{DateTime, NaiveDate, Utc},
    serde::{Deserialize, Serialize},
};

/// Opaque identifier for a message destination on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Category of periodic report a recipient is subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Cases,
    Vaccinations,
    IcuOccupancy,
}

/// One not-yet-sent outbound message tied to a recipient and report kind.
///
/// Created when a new report becomes available for a recipient who has not
/// received it yet; consumed exactly once when the dispatcher confirms a
/// successful send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDelivery {
    pub recipient: RecipientId,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Date of the report this delivery carries, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
}

impl PendingDelivery {
    pub fn text(recipient: impl Into<RecipientId>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            body: body.into(),
            attachments: Vec::new(),
            report_date: None,
        }
    }
}

/// Ordered file-like content sent alongside a message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub media: Vec<u8>,
}

/// Record of a recipient as the directory sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientRecord {
    pub id: RecipientId,
    pub enabled: bool,
    pub last_activity: DateTime<Utc>,
}

/// Inbound mention/free-text event from an external source.
///
/// Marked answered exactly once after a reply attempt, whether or not a
/// region could be resolved from the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionEvent {
    pub conversation_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Identifier of an administrative region in the gazetteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable administrative-region reference data, loaded once at startup.
/// Multiple regions may share a name prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<RegionId>,
}

/// Outcome of resolving free text to an administrative region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// Exactly one region matched.
    Unique { region: RegionId },
    /// Several regions matched and could not be narrowed down.
    Ambiguous { candidates: usize },
    /// Nothing matched, or the text was not a region query at all.
    NotFound,
}

impl ResolutionResult {
    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Unique { .. })
    }
}

/// Outcome counts of one dispatch batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of send attempts made (equals the number of input items).
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}
