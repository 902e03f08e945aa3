//! Asynchronous notification queue
//!
//! Jobs are handed to a background worker over a bounded channel. The worker tries
//! each job up to `max_attempts` times with a fixed backoff and drops it afterwards.
//! Enqueueing never blocks and never fails a submission.

use crate::config::NotificationSettings;
use crate::error::NotifyError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationJob {
    pub recipient_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

/// Accepts jobs for later delivery.
pub trait Notifier: Send + Sync {
    fn enqueue(&self, job: NotificationJob) -> Result<(), NotifyError>;
}

/// Delivery backend driven by the queue worker.
pub trait NotificationSink: Send + Sync + 'static {
    fn deliver(&self, job: &NotificationJob) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Sink that only logs; used when no delivery backend is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), NotifyError> {
        debug!(recipient_id = %job.recipient_id, message = %job.message, "notification delivered");
        Ok(())
    }
}

/// Sender half of the queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Start the worker on the current tokio runtime.
    pub fn spawn<K: NotificationSink>(sink: K, settings: NotificationSettings) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(Arc::new(sink), receiver, settings));
        (Self { sender }, worker)
    }

    /// Close the queue; the worker finishes the jobs already queued, then exits.
    pub async fn shutdown(self, worker: JoinHandle<()>) {
        drop(self.sender);
        if let Err(e) = worker.await {
            error!(error = %e, "notification worker terminated abnormally");
        }
    }
}

impl Notifier for NotificationQueue {
    fn enqueue(&self, job: NotificationJob) -> Result<(), NotifyError> {
        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

async fn run_worker<K: NotificationSink>(
    sink: Arc<K>,
    mut receiver: mpsc::Receiver<NotificationJob>,
    settings: NotificationSettings,
) {
    while let Some(job) = receiver.recv().await {
        deliver_with_retry(sink.as_ref(), &job, &settings).await;
    }
    debug!("notification queue closed, worker exiting");
}

/// Returns whether the job was delivered.
pub async fn deliver_with_retry<K: NotificationSink + ?Sized>(
    sink: &K,
    job: &NotificationJob,
    settings: &NotificationSettings,
) -> bool {
    let max_attempts = settings.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match sink.deliver(job).await {
            Ok(()) => return true,
            Err(e) if attempt < max_attempts => {
                warn!(recipient_id = %job.recipient_id, attempt, error = %e, "notification delivery failed, retrying");
                tokio::time::sleep(settings.backoff()).await;
            }
            Err(e) => {
                warn!(recipient_id = %job.recipient_id, attempt, error = %e, "notification dropped after final attempt");
            }
        }
    }
    false
}
