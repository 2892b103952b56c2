use crate::models::{ProgressStatus, ProgressSummary, UploadBatch};
use crate::state::AppStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Periodically refreshes the task list and retires finished uploads
pub struct TaskPoller {
    store: Arc<AppStore>,
    period: Duration,
    shutdown: watch::Receiver<bool>,
    finished_tx: Option<mpsc::UnboundedSender<(UploadBatch, ProgressSummary)>>,
}

impl TaskPoller {
    pub fn new(store: Arc<AppStore>, period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            store,
            period,
            shutdown,
            finished_tx: None,
        }
    }

    /// Send every retired upload, with its final summary, to `tx`.
    pub fn report_finished(
        mut self,
        tx: mpsc::UnboundedSender<(UploadBatch, ProgressSummary)>,
    ) -> Self {
        self.finished_tx = Some(tx);
        self
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Task poller started (every {:?})", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Task poller shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let finished = self.poll_once().await;
                    if let Some(tx) = &self.finished_tx {
                        for upload in finished {
                            // Receiver gone: nobody is watching anymore
                            let _ = tx.send(upload);
                        }
                    }
                }
            }
        }
    }

    /// One refresh cycle, returning the uploads it retired.
    /// Errors are logged and retried on the next tick.
    pub async fn poll_once(&self) -> Vec<(UploadBatch, ProgressSummary)> {
        if let Err(e) = self.store.refresh_tasks().await {
            tracing::error!("Failed to refresh tasks: {}", e);
            return Vec::new();
        }

        for (batch, summary) in self.store.active_upload_progress().await {
            tracing::debug!(
                "Upload into \"{}\": {}% ({} done, {} failed of {})",
                batch.partition,
                summary.progress,
                summary.completed_files,
                summary.failed_files,
                batch.file_ids.len()
            );
        }

        match self.store.prune_finished_uploads().await {
            Ok(finished) => {
                for (batch, summary) in &finished {
                    match summary.status {
                        ProgressStatus::Success => tracing::info!(
                            "✅ Upload into \"{}\" completed ({} files)",
                            batch.partition,
                            summary.completed_files
                        ),
                        _ => tracing::warn!(
                            "⚠️  Upload into \"{}\" finished with {} failed file(s)",
                            batch.partition,
                            summary.failed_files
                        ),
                    }
                }
                finished
            }
            Err(e) => {
                tracing::error!("Failed to update active uploads: {}", e);
                Vec::new()
            }
        }
    }
}
