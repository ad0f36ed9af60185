//! Batch queue types

use courier_core::ApiError;
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::BoxedRequest;

/// When a batch queue is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Flush this long after the first item was queued.
    pub max_wait: Duration,
    /// Flush immediately once this many items are queued.
    pub max_batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_millis(50),
            max_batch_size: 10,
        }
    }
}

impl BatchOptions {
    pub fn new(max_wait: Duration, max_batch_size: usize) -> Self {
        Self {
            max_wait,
            max_batch_size: max_batch_size.max(1),
        }
    }
}

pub(crate) struct BatchItem<T> {
    pub(crate) key: String,
    pub(crate) request: BoxedRequest<T>,
    pub(crate) respond: oneshot::Sender<Result<T, ApiError>>,
}

pub(crate) struct BatchQueue<T> {
    /// Distinguishes this queue from a later one under the same batch id.
    pub(crate) id: u64,
    pub(crate) items: Vec<BatchItem<T>>,
    pub(crate) timer: Option<JoinHandle<()>>,
}

impl<T> BatchQueue<T> {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            items: Vec::new(),
            timer: None,
        }
    }

    pub(crate) fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Run every queued request concurrently and hand each caller its own result.
pub(crate) async fn execute_batch<T>(batch_id: String, items: Vec<BatchItem<T>>) {
    debug!(batch_id = %batch_id, size = items.len(), "flushing batch");

    let (requests, responders): (Vec<_>, Vec<_>) = items
        .into_iter()
        .map(|item| (item.request, (item.key, item.respond)))
        .unzip();

    let results = join_all(requests).await;

    for ((key, respond), result) in responders.into_iter().zip(results) {
        if respond.send(result).is_err() {
            debug!(batch_id = %batch_id, key = %key, "batch caller dropped before result");
        }
    }
}
