//! In-flight deduplication and request batching

use crate::batch::{BatchItem, BatchOptions, BatchQueue, execute_batch};
use crate::BoxedRequest;
use courier_core::ApiError;
use futures::FutureExt;
use futures::future::Shared;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

type SharedRequest<T> = Shared<BoxedRequest<T>>;

struct PendingEntry<T: Clone> {
    id: u64,
    request: SharedRequest<T>,
    cleanup: JoinHandle<()>,
}

struct Inner<T: Clone> {
    pending: Mutex<HashMap<String, PendingEntry<T>>>,
    batches: Mutex<HashMap<String, BatchQueue<T>>>,
    /// Bumped by `clear()`; in-flight dedup requests watch it.
    cancel: watch::Sender<u64>,
    next_id: AtomicU64,
}

impl<T: Clone> Inner<T> {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Collapses duplicate requests and groups related ones.
///
/// Cheap to clone; clones share state.
pub struct RequestOptimizer<T: Clone> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Clone for RequestOptimizer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> RequestOptimizer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                batches: Mutex::new(HashMap::new()),
                cancel,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Share one execution of `request_fn` among concurrent callers of `key`.
    ///
    /// After the request settles the key keeps returning the settled result
    /// for `ttl`, then is evicted.
    pub async fn deduplicate<F, Fut>(
        &self,
        key: impl Into<String>,
        request_fn: F,
        ttl: Duration,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let key = key.into();

        let request = {
            let mut pending = self.inner.pending.lock();
            match pending.get(&key) {
                Some(entry) => {
                    debug!(key = %key, "joining in-flight request");
                    entry.request.clone()
                }
                None => {
                    let id = self.inner.next_id();
                    let request = self.cancellable(request_fn());
                    let cleanup = self.schedule_eviction(key.clone(), id, request.clone(), ttl);
                    pending.insert(
                        key,
                        PendingEntry {
                            id,
                            request: request.clone(),
                            cleanup,
                        },
                    );
                    request
                }
            }
        };

        request.await
    }

    fn cancellable<Fut>(&self, request: Fut) -> SharedRequest<T>
    where
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let mut cancel = self.inner.cancel.subscribe();
        let boxed: BoxedRequest<T> = Box::pin(async move {
            tokio::select! {
                result = request => result,
                Ok(()) = cancel.changed() => Err(ApiError::cancelled()),
            }
        });
        boxed.shared()
    }

    fn schedule_eviction(
        &self,
        key: String,
        id: u64,
        request: SharedRequest<T>,
        ttl: Duration,
    ) -> JoinHandle<()> {
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let _ = request.await;
            tokio::time::sleep(ttl).await;

            if let Some(inner) = inner.upgrade() {
                let mut pending = inner.pending.lock();
                if pending.get(&key).is_some_and(|entry| entry.id == id) {
                    pending.remove(&key);
                }
            }
        })
    }

    /// Queue `request_fn` under `batch_id` and resolve with its own result.
    ///
    /// The queue flushes when it reaches `max_batch_size` or `max_wait` after
    /// its first item. Items run concurrently; one failure never affects the
    /// others.
    pub async fn batch<F, Fut>(
        &self,
        batch_id: impl Into<String>,
        request_key: impl Into<String>,
        request_fn: F,
        options: BatchOptions,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let batch_id = batch_id.into();
        let (respond, receive) = oneshot::channel();
        let item = BatchItem {
            key: request_key.into(),
            request: Box::pin(request_fn()),
            respond,
        };

        let full = {
            let mut batches = self.inner.batches.lock();
            let queue = batches
                .entry(batch_id.clone())
                .or_insert_with(|| BatchQueue::new(self.inner.next_id()));
            queue.items.push(item);

            if queue.items.len() >= options.max_batch_size.max(1) {
                batches.remove(&batch_id).map(|mut queue| {
                    queue.stop_timer();
                    queue.items
                })
            } else {
                if queue.timer.is_none() {
                    queue.timer = Some(self.schedule_flush(batch_id.clone(), queue.id, options.max_wait));
                }
                None
            }
        };

        if let Some(items) = full {
            tokio::spawn(execute_batch(batch_id, items));
        }

        receive.await.unwrap_or_else(|_| Err(ApiError::cancelled()))
    }

    fn schedule_flush(&self, batch_id: String, queue_id: u64, max_wait: Duration) -> JoinHandle<()> {
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(max_wait).await;

            let Some(inner) = inner.upgrade() else {
                return;
            };
            let items = {
                let mut batches = inner.batches.lock();
                match batches.get(&batch_id) {
                    Some(queue) if queue.id == queue_id => {
                        batches.remove(&batch_id).map(|queue| queue.items)
                    }
                    _ => None,
                }
            };
            drop(inner);

            if let Some(items) = items {
                execute_batch(batch_id, items).await;
            }
        })
    }

    /// Reject every pending dedup caller and queued batch item with a
    /// cancellation error and stop all timers.
    pub fn clear(&self) {
        self.inner.cancel.send_modify(|generation| *generation += 1);

        let pending: Vec<PendingEntry<T>> = self.inner.pending.lock().drain().map(|(_, e)| e).collect();
        for entry in &pending {
            entry.cleanup.abort();
        }

        let batches: Vec<BatchQueue<T>> = self.inner.batches.lock().drain().map(|(_, q)| q).collect();
        for mut queue in batches {
            queue.stop_timer();
            // Dropping the items drops their responders, which rejects the callers.
        }

        debug!(
            pending = pending.len(),
            "cleared request optimizer"
        );
    }

    /// Number of keys currently reserved for deduplication.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Number of items waiting in the given batch queue.
    pub fn queued_count(&self, batch_id: &str) -> usize {
        self.inner
            .batches
            .lock()
            .get(batch_id)
            .map(|queue| queue.items.len())
            .unwrap_or(0)
    }
}

impl<T> Default for RequestOptimizer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
