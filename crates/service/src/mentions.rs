//! Mention polling and query answering.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    lagebot_common::types::{MentionEvent, RecipientId, RegionId, ResolutionResult},
    lagebot_directory::UserDirectory,
    lagebot_resolver::{
        QueryResolver,
        normalize::{is_conversational_noise, strip_location_link, tokenize},
    },
    tracing::{debug, info, warn},
};

use crate::config::ServiceConfig;

/// Source of inbound mention events and the reply path back into the same
/// conversations. Implemented by the concrete social-network client.
#[async_trait]
pub trait MentionSource: Send + Sync {
    async fn mentions(&self) -> Result<Vec<MentionEvent>>;

    async fn reply(&self, conversation_id: &str, body: &str) -> Result<()>;
}

/// Builds the human-readable status reply for a resolved region. Report
/// wording lives with the caller, not here.
pub type RegionReplyFn = Arc<dyn Fn(RegionId) -> String + Send + Sync>;

/// Outcome counts of one mention run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionRunReport {
    pub seen: usize,
    pub answered: usize,
    pub resolved: usize,
    pub discarded: usize,
}

/// Answers each mention conversation at most once.
///
/// Every processed mention is marked answered, whether the text resolved,
/// was discarded as noise, or the reply failed to send. A conversation is
/// never answered twice. Conversational noise gets no reply at all; the
/// "not understood" reply is reserved for texts that look like a region
/// query but resolve to nothing.
pub struct MentionService {
    source: Arc<dyn MentionSource>,
    directory: Arc<dyn UserDirectory>,
    resolver: Arc<QueryResolver>,
    reply_fn: RegionReplyFn,
    config: ServiceConfig,
}

impl MentionService {
    pub fn new(
        source: Arc<dyn MentionSource>,
        directory: Arc<dyn UserDirectory>,
        resolver: Arc<QueryResolver>,
        reply_fn: RegionReplyFn,
        config: ServiceConfig,
    ) -> Self {
        Self {
            source,
            directory,
            resolver,
            reply_fn,
            config,
        }
    }

    /// Process everything the source currently has.
    pub async fn run_once(&self) -> Result<MentionRunReport> {
        let mut report = MentionRunReport::default();

        for mention in self.source.mentions().await? {
            report.seen += 1;
            if self.directory.is_answered(&mention.conversation_id).await? {
                continue;
            }

            // Chatty thread messages are not queries; mark them answered
            // without replying so the thread is not spammed.
            if is_conversational_noise(&tokenize(strip_location_link(&mention.text))) {
                debug!(
                    conversation = %mention.conversation_id,
                    "discarding conversational mention"
                );
                self.directory.set_answered(&mention.conversation_id).await?;
                report.answered += 1;
                report.discarded += 1;
                continue;
            }

            let body = match self.resolver.resolve(&mention.text).await {
                ResolutionResult::Unique { region } => {
                    report.resolved += 1;
                    debug!(
                        conversation = %mention.conversation_id,
                        %region,
                        "mention resolved to region"
                    );
                    match &mention.display_name {
                        Some(name) => format!("{name} {}", (self.reply_fn)(region)),
                        None => (self.reply_fn)(region),
                    }
                },
                ResolutionResult::Ambiguous { .. } | ResolutionResult::NotFound => {
                    debug!(
                        conversation = %mention.conversation_id,
                        text = %mention.text,
                        "mention did not resolve"
                    );
                    self.config.not_understood_reply.clone()
                },
            };

            if let Err(error) = self.source.reply(&mention.conversation_id, &body).await {
                warn!(
                    conversation = %mention.conversation_id,
                    error = %error,
                    "mention reply failed"
                );
            }

            // Answered means "a reply attempt was made", not "the reply
            // arrived": a broken conversation must not be retried forever.
            self.directory.set_answered(&mention.conversation_id).await?;
            report.answered += 1;
        }

        info!(
            seen = report.seen,
            answered = report.answered,
            resolved = report.resolved,
            discarded = report.discarded,
            "mention run finished"
        );
        Ok(report)
    }

    /// Record a direct inbound interaction from `recipient`.
    ///
    /// Recipients quarantined by delivery failures come back through here:
    /// their query should be handled with the account active again.
    pub async fn note_inbound(&self, recipient: &RecipientId) -> Result<()> {
        if !self.directory.is_enabled(recipient).await? {
            info!(recipient = %recipient, "re-enabling recipient after inbound message");
            self.directory.enable_recipient(recipient).await?;
        }
        self.directory.touch_activity(recipient).await?;
        Ok(())
    }
}
