//! Timer-driven report delivery runs.

use std::{sync::Arc, time::Duration};

use {
    anyhow::Result,
    lagebot_common::types::{BatchReport, ReportKind},
    lagebot_directory::UserDirectory,
    lagebot_dispatch::Dispatcher,
    tokio::{
        sync::{Mutex, Notify, RwLock},
        task::JoinHandle,
    },
    tracing::{debug, error, info},
};

use crate::config::ServiceConfig;

/// Periodic driver for report batches on one channel.
///
/// One sequential task: runs are never concurrent with each other, so the
/// dispatcher's inter-send pacing is the only thing limiting send rate.
pub struct ReportService {
    directory: Arc<dyn UserDirectory>,
    dispatcher: Arc<Dispatcher>,
    kinds: Vec<ReportKind>,
    config: ServiceConfig,
    wake_notify: Arc<Notify>,
    running: RwLock<bool>,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReportService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        dispatcher: Arc<Dispatcher>,
        kinds: Vec<ReportKind>,
        config: ServiceConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            directory,
            dispatcher,
            kinds,
            config,
            wake_notify: Arc::new(Notify::new()),
            running: RwLock::new(false),
            timer_handle: Mutex::new(None),
        })
    }

    /// Start the timer loop.
    pub async fn start(self: &Arc<Self>) {
        *self.running.write().await = true;
        let svc = Arc::clone(self);
        let handle = tokio::spawn(async move {
            svc.timer_loop().await;
        });
        *self.timer_handle.lock().await = Some(handle);
        info!(kinds = self.kinds.len(), "report service started");
    }

    /// Stop the timer loop.
    pub async fn stop(&self) {
        *self.running.write().await = false;
        self.wake_notify.notify_one();
        let mut handle = self.timer_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("report service stopped");
    }

    /// Trigger a run without waiting for the next tick.
    pub fn wake(&self) {
        self.wake_notify.notify_one();
    }

    /// Deliver everything currently pending for `kind`.
    pub async fn run_once(&self, kind: ReportKind) -> Result<BatchReport> {
        let items = self.directory.list_pending_deliveries(kind).await?;
        if items.is_empty() {
            debug!(?kind, "no pending reports");
            return Ok(BatchReport::default());
        }
        info!(?kind, count = items.len(), "pending reports to send");
        let report = self.dispatcher.dispatch_batch(kind, &items).await?;
        Ok(report)
    }

    async fn timer_loop(self: &Arc<Self>) {
        loop {
            if !*self.running.read().await {
                break;
            }

            let notify = Arc::clone(&self.wake_notify);
            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)) => {},
                () = notify.notified() => {
                    debug!("report loop woken by notify");
                },
            }

            if !*self.running.read().await {
                break;
            }

            for kind in &self.kinds {
                if let Err(err) = self.run_once(*kind).await {
                    // A dead transport aborts this run only; recovery is
                    // scheduled and the next tick tries again.
                    error!(?kind, error = %err, "report run aborted");
                    self.dispatcher.recover_transport().await;
                }
            }
        }
    }
}
