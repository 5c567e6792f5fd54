//! The batch delivery loop.

use std::{collections::HashMap, sync::Arc};

use {
    lagebot_channels::{MessageSink, SendReceipt, ServiceControl},
    lagebot_common::types::{Attachment, BatchReport, PendingDelivery, RecipientId, ReportKind},
    lagebot_directory::UserDirectory,
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    backoff::{BackoffPolicy, BackoffState, SendOutcome},
};

/// Builds the optional per-recipient "current status" reply appended after a
/// broadcast send. Returns `None` when there is nothing to append for this
/// recipient.
pub type StatusReplyFn =
    Arc<dyn Fn(&RecipientId) -> Option<(String, Vec<Attachment>)> + Send + Sync>;

/// Delivers batches of outbound messages, one recipient at a time.
///
/// Pacing and quarantine decisions come from [`BackoffPolicy`]; this type
/// performs the sends, the sleeps and the directory writes.
pub struct Dispatcher {
    sink: Arc<dyn MessageSink>,
    directory: Arc<dyn UserDirectory>,
    control: Arc<dyn ServiceControl>,
    policy: BackoffPolicy,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn MessageSink>,
        directory: Arc<dyn UserDirectory>,
        control: Arc<dyn ServiceControl>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            sink,
            directory,
            control,
            policy,
        }
    }

    /// Deliver `items` in order. Items are expected to be pre-filtered to
    /// "not yet sent"; a successful send is confirmed in the directory, a
    /// failed one quarantines the recipient. Individual failures never abort
    /// the batch; only a total transport failure does.
    pub async fn dispatch_batch(
        &self,
        kind: ReportKind,
        items: &[PendingDelivery],
    ) -> Result<BatchReport> {
        let total = items.len();
        let mut report = BatchReport::default();
        let mut state = BackoffState::initial(&self.policy);
        let mut failures: HashMap<RecipientId, u32> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            debug!(
                recipient = %item.recipient,
                index,
                total,
                "attempting report delivery"
            );
            let receipt = self
                .sink
                .send(&item.recipient, &item.body, &item.attachments)
                .await?;
            report.attempted += 1;

            if receipt.is_delivered() {
                self.directory
                    .confirm_delivery(&item.recipient, kind)
                    .await?;
                info!(
                    recipient = %item.recipient,
                    index,
                    total,
                    "delivered report"
                );
            }

            state = self
                .settle(&item.recipient, receipt, &mut failures, state, &mut report)
                .await?;
        }

        if report.attempted > 0 {
            self.recover_transport().await;
        }
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "report batch finished"
        );
        Ok(report)
    }

    /// Send `body` to each recipient; when `append_report` is set, a second,
    /// recipient-specific status message built by `report_fn` follows the
    /// first. Both sends share the batch's backoff and quarantine accounting.
    pub async fn broadcast(
        &self,
        recipients: &[RecipientId],
        body: &str,
        append_report: bool,
        report_fn: StatusReplyFn,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut state = BackoffState::initial(&self.policy);
        let mut failures: HashMap<RecipientId, u32> = HashMap::new();

        for recipient in recipients {
            let receipt = self.sink.send(recipient, body, &[]).await?;
            report.attempted += 1;
            state = self
                .settle(recipient, receipt, &mut failures, state, &mut report)
                .await?;

            if append_report
                && let Some((status_body, attachments)) = report_fn(recipient)
            {
                let receipt = self.sink.send(recipient, &status_body, &attachments).await?;
                report.attempted += 1;
                state = self
                    .settle(recipient, receipt, &mut failures, state, &mut report)
                    .await?;
            }
        }

        if report.attempted > 0 {
            self.recover_transport().await;
        }
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast batch finished"
        );
        Ok(report)
    }

    /// Ask the transport to restart itself after a batch. A non-zero outcome
    /// is logged, never escalated: the next scheduled run must still happen.
    pub async fn recover_transport(&self) {
        if let Err(error) = self.control.restart_transport().await {
            warn!(error = %error, "transport restart failed");
        } else {
            info!("transport restarted after batch");
        }
    }

    /// Bookkeeping shared by both batch flavors: quarantine decision, backoff
    /// transition and the unconditional inter-send pause.
    async fn settle(
        &self,
        recipient: &RecipientId,
        receipt: SendReceipt,
        failures: &mut HashMap<RecipientId, u32>,
        state: BackoffState,
        report: &mut BatchReport,
    ) -> Result<BackoffState> {
        let outcome = if receipt.is_delivered() {
            report.delivered += 1;
            failures.remove(recipient);
            SendOutcome::Delivered
        } else {
            report.failed += 1;
            let count = failures.entry(recipient.clone()).or_insert(0);
            *count += 1;
            if self.policy.should_disable(*count) {
                // Quarantine until a later inbound interaction re-enables the
                // recipient; repeat batches must stop targeting them.
                self.directory.disable_recipient(recipient).await?;
                warn!(
                    recipient = %recipient,
                    consecutive_failures = *count,
                    "send failed, recipient disabled"
                );
            } else {
                warn!(
                    recipient = %recipient,
                    consecutive_failures = *count,
                    "send failed"
                );
            }
            SendOutcome::Rejected
        };

        let next = state.next(&self.policy, outcome);
        debug!(
            delay_ms = next.delay().as_millis() as u64,
            "pausing between sends"
        );
        tokio::time::sleep(next.delay()).await;
        Ok(next)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use {
        async_trait::async_trait,
        lagebot_channels::{Error as ChannelError, Result as ChannelResult},
        lagebot_directory::InMemoryDirectory,
    };

    use super::*;

    /// Sink that replays a scripted sequence of outcomes and records calls.
    #[derive(Default)]
    struct ScriptedSink {
        outcomes: Mutex<VecDeque<ChannelResult<SendReceipt>>>,
        calls: Mutex<Vec<(RecipientId, String)>>,
    }

    impl ScriptedSink {
        fn with_outcomes(outcomes: impl IntoIterator<Item = ChannelResult<SendReceipt>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(RecipientId, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSink for ScriptedSink {
        async fn send(
            &self,
            recipient: &RecipientId,
            body: &str,
            _attachments: &[Attachment],
        ) -> ChannelResult<SendReceipt> {
            self.calls
                .lock()
                .unwrap()
                .push((recipient.clone(), body.to_string()));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SendReceipt::Delivered))
        }
    }

    #[derive(Default)]
    struct CountingControl {
        restarts: AtomicUsize,
    }

    #[async_trait]
    impl ServiceControl for CountingControl {
        async fn restart_transport(&self) -> ChannelResult<()> {
            self.restarts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            floor_secs: 0.001,
            ceiling_secs: 0.1,
            initial_min_secs: 0.001,
            initial_max_secs: 0.002,
            ..BackoffPolicy::default()
        }
    }

    fn items(names: &[&str]) -> Vec<PendingDelivery> {
        names
            .iter()
            .map(|n| PendingDelivery::text(RecipientId::new(*n), format!("report for {n}")))
            .collect()
    }

    fn directory_with(names: &[&str]) -> Arc<InMemoryDirectory> {
        let dir = Arc::new(InMemoryDirectory::new());
        for item in items(names) {
            dir.enqueue_delivery(ReportKind::Cases, item);
        }
        dir
    }

    struct Fixture {
        sink: Arc<ScriptedSink>,
        directory: Arc<InMemoryDirectory>,
        control: Arc<CountingControl>,
        dispatcher: Dispatcher,
    }

    fn fixture(
        names: &[&str],
        outcomes: impl IntoIterator<Item = ChannelResult<SendReceipt>>,
        policy: BackoffPolicy,
    ) -> Fixture {
        let sink = Arc::new(ScriptedSink::with_outcomes(outcomes));
        let directory = directory_with(names);
        let control = Arc::new(CountingControl::default());
        let dispatcher = Dispatcher::new(
            Arc::clone(&sink) as Arc<dyn MessageSink>,
            Arc::clone(&directory) as Arc<dyn UserDirectory>,
            Arc::clone(&control) as Arc<dyn ServiceControl>,
            policy,
        );
        Fixture {
            sink,
            directory,
            control,
            dispatcher,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_equal_items_and_every_item_terminates() {
        let f = fixture(
            &["a", "b", "c"],
            [
                Ok(SendReceipt::Delivered),
                Ok(SendReceipt::Rejected),
                Ok(SendReceipt::Delivered),
            ],
            fast_policy(),
        );
        let batch = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();

        let report = f
            .dispatcher
            .dispatch_batch(ReportKind::Cases, &batch)
            .await
            .unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);

        // a and c confirmed, b disabled: nothing pending remains visible.
        assert!(!f.directory.is_enabled(&RecipientId::new("b")).await.unwrap());
        let remaining = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn order_is_preserved_and_items_are_not_retried() {
        let f = fixture(
            &["a", "b", "c"],
            [
                Ok(SendReceipt::Rejected),
                Ok(SendReceipt::Delivered),
                Ok(SendReceipt::Delivered),
            ],
            fast_policy(),
        );
        let batch = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();

        f.dispatcher
            .dispatch_batch(ReportKind::Cases, &batch)
            .await
            .unwrap();

        let order: Vec<String> = f.sink.calls().iter().map(|(r, _)| r.0.clone()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_loss_aborts_the_batch() {
        let f = fixture(
            &["a", "b", "c"],
            [
                Ok(SendReceipt::Delivered),
                Err(ChannelError::transport_lost("socket closed")),
            ],
            fast_policy(),
        );
        let batch = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();

        let result = f.dispatcher.dispatch_batch(ReportKind::Cases, &batch).await;
        assert!(matches!(result, Err(crate::Error::Transport(_))));
        // Only the first two items were ever attempted.
        assert_eq!(f.sink.calls().len(), 2);
        // The first delivery was confirmed before the abort.
        let remaining = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_runs_once_after_a_non_empty_batch() {
        let f = fixture(&["a"], [Ok(SendReceipt::Delivered)], fast_policy());
        let batch = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();

        f.dispatcher
            .dispatch_batch(ReportKind::Cases, &batch)
            .await
            .unwrap();
        assert_eq!(f.control.restarts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_is_skipped_for_an_empty_batch() {
        let f = fixture(&[], [], fast_policy());
        let report = f
            .dispatcher
            .dispatch_batch(ReportKind::Cases, &[])
            .await
            .unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(f.control.restarts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn every_send_is_followed_by_the_pause_including_the_last() {
        // A degenerate initial window pins the starting delay at 0.5s, and
        // 0.5s is below the decay threshold, so each delivered send leaves
        // the delay unchanged: three sends, three 0.5s pauses.
        let policy = BackoffPolicy {
            floor_secs: 0.25,
            initial_min_secs: 0.5,
            initial_max_secs: 0.5,
            ..BackoffPolicy::default()
        };
        let f = fixture(&["a", "b", "c"], [], policy);
        let batch = f
            .directory
            .list_pending_deliveries(ReportKind::Cases)
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        f.dispatcher
            .dispatch_batch(ReportKind::Cases, &batch)
            .await
            .unwrap();

        assert_eq!(
            started.elapsed(),
            std::time::Duration::from_millis(1500),
            "expected a pause after every send, including the last one"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn higher_disable_threshold_tolerates_single_failures() {
        let policy = BackoffPolicy {
            disable_after_failures: 2,
            ..fast_policy()
        };
        let f = fixture(
            &["a"],
            [Ok(SendReceipt::Rejected), Ok(SendReceipt::Rejected)],
            policy,
        );

        // Two broadcast sends to the same recipient in one batch.
        let report = f
            .dispatcher
            .broadcast(
                &[RecipientId::new("a")],
                "maintenance notice",
                true,
                Arc::new(|_r: &RecipientId| Some(("status".to_string(), Vec::new()))),
            )
            .await
            .unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 2);
        // Disabled only on the second consecutive failure.
        assert!(!f.directory.is_enabled(&RecipientId::new("a")).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_with_append_report_accounts_both_sends() {
        let f = fixture(
            &["a", "b"],
            [
                Ok(SendReceipt::Delivered),
                Ok(SendReceipt::Delivered),
                Ok(SendReceipt::Delivered),
                Ok(SendReceipt::Delivered),
            ],
            fast_policy(),
        );

        let report = f
            .dispatcher
            .broadcast(
                &[RecipientId::new("a"), RecipientId::new("b")],
                "hello",
                true,
                Arc::new(|r: &RecipientId| Some((format!("status for {r}"), Vec::new()))),
            )
            .await
            .unwrap();

        assert_eq!(report.attempted, 4);
        assert_eq!(report.delivered, 4);
        let bodies: Vec<String> = f.sink.calls().iter().map(|(_, b)| b.clone()).collect();
        assert_eq!(bodies, ["hello", "status for a", "hello", "status for b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_without_append_sends_once_per_recipient() {
        let f = fixture(&["a", "b"], [], fast_policy());
        let report = f
            .dispatcher
            .broadcast(
                &[RecipientId::new("a"), RecipientId::new("b")],
                "hello",
                false,
                Arc::new(|_r: &RecipientId| None),
            )
            .await
            .unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(f.sink.calls().len(), 2);
    }
}
