// ── Non-blocking cache of the latest async result ──
//
// Wraps one slow producer. Callers poll; each poll settles the in-flight
// refresh if it has finished, starts the next one when nothing is in
// flight, and hands back the most recent successful value without ever
// waiting. At most one producer invocation is outstanding per cache.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Where the current refresh stands.
enum Flight<V> {
    Idle,
    Pending {
        result: oneshot::Receiver<Result<V, CoreError>>,
        task: JoinHandle<()>,
    },
    Ready(Result<V, CoreError>),
}

impl<V> Flight<V> {
    /// Move `Pending` to `Ready` (or `Idle` when cancelled) if the task is done.
    fn settle(self, cache: &str) -> Result<Self, CoreError> {
        let Self::Pending { mut result, mut task } = self else {
            return Ok(self);
        };
        match result.try_recv() {
            Ok(outcome) => Ok(Self::Ready(outcome)),
            Err(TryRecvError::Empty) => Ok(Self::Pending { result, task }),
            // The producer went away without delivering a result.
            Err(TryRecvError::Closed) => match (&mut task).now_or_never() {
                Some(Err(e)) if e.is_panic() => Ok(Self::Ready(Err(CoreError::ProducerPanicked {
                    cache: cache.to_owned(),
                }))),
                Some(Err(_)) => {
                    debug!(cache, "in-flight refresh was cancelled, restarting");
                    Ok(Self::Idle)
                }
                Some(Ok(())) => Err(CoreError::Interrupted {
                    cache: cache.to_owned(),
                }),
                // Still unwinding; the join result decides on a later poll.
                None => Ok(Self::Pending { result, task }),
            },
        }
    }
}

struct CacheState<V> {
    flight: Flight<V>,
    last_value: Option<V>,
}

/// Latest-value cache over a repeatedly invoked async producer.
///
/// `poll` never blocks: the producer runs on the runtime behind `runtime`,
/// and the lock only covers the state transition. Producer failures are
/// logged and the previous value keeps being served.
pub struct AsyncResultCache<V> {
    name: String,
    runtime: Handle,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone + Send + 'static> AsyncResultCache<V> {
    pub fn new(name: impl Into<String>, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            runtime,
            state: Mutex::new(CacheState {
                flight: Flight::Idle,
                last_value: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the latest value, starting or restarting the producer as needed.
    ///
    /// `producer` is only invoked when a new refresh is started, so it should
    /// do nothing but build the future. The only error is
    /// [`CoreError::Interrupted`]: a refresh that finished without its result
    /// being retrievable.
    pub fn poll<F, Fut>(&self, producer: F) -> Result<Option<V>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        let mut state = self.lock();
        let flight = std::mem::replace(&mut state.flight, Flight::Idle).settle(&self.name)?;

        match flight {
            pending @ Flight::Pending { .. } => {
                state.flight = pending;
                return Ok(state.last_value.clone());
            }
            Flight::Ready(Ok(value)) => {
                debug!(cache = %self.name, "refresh completed");
                state.last_value = Some(value);
            }
            Flight::Ready(Err(e)) => {
                warn!(cache = %self.name, error = %e, "refresh failed, serving previous value");
            }
            Flight::Idle => {}
        }

        state.flight = self.start(producer);
        Ok(state.last_value.clone())
    }

    /// The most recent successful value, without touching the producer.
    pub fn last_value(&self) -> Option<V> {
        self.lock().last_value.clone()
    }

    /// Whether a refresh is outstanding (including a finished one not yet polled).
    pub fn is_pending(&self) -> bool {
        matches!(self.lock().flight, Flight::Pending { .. })
    }

    /// Handle for cancelling the outstanding refresh from outside the cache.
    pub fn abort_handle(&self) -> Option<AbortHandle> {
        match &self.lock().flight {
            Flight::Pending { task, .. } => Some(task.abort_handle()),
            _ => None,
        }
    }

    fn start<F, Fut>(&self, producer: F) -> Flight<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let future = producer();
        let task = self.runtime.spawn(async move {
            // The receiver is gone only if the cache itself was dropped.
            let _ = tx.send(future.await);
        });
        Flight::Pending { result: rx, task }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::BoxFuture;

    type Refresh = BoxFuture<'static, Result<u32, CoreError>>;

    fn cache() -> AsyncResultCache<u32> {
        AsyncResultCache::new("test", Handle::current())
    }

    /// Producer that never completes, counting invocations.
    fn stuck(calls: &Arc<AtomicUsize>) -> impl FnOnce() -> Refresh {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().boxed()
        }
    }

    /// Poll until the cache reports `want`, letting background tasks run in between.
    async fn poll_until<F>(cache: &AsyncResultCache<u32>, want: Option<u32>, mut producer: F)
    where
        F: FnMut() -> Refresh,
    {
        for _ in 0..200 {
            if cache.poll(&mut producer).unwrap() == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("cache never reported {want:?}");
    }

    #[tokio::test]
    async fn first_poll_starts_producer_and_returns_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();

        assert_eq!(cache.poll(stuck(&calls)).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_pending());
    }

    #[tokio::test]
    async fn repeated_polls_while_pending_start_nothing_new() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();

        for _ in 0..10 {
            assert_eq!(cache.poll(stuck(&calls)).unwrap(), None);
            tokio::task::yield_now().await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completed_value_is_served_and_next_refresh_started() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();
        let counter = Arc::clone(&calls);
        let producer = move || -> Refresh {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(7)
                } else {
                    std::future::pending().await
                }
            }
            .boxed()
        };

        poll_until(&cache, Some(7), producer).await;

        // The value was picked up and a second refresh is now in flight.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.last_value(), Some(7));
        assert!(cache.is_pending());
    }

    #[tokio::test]
    async fn failure_keeps_previous_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();
        let counter = Arc::clone(&calls);
        let producer = move || -> Refresh {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Ok(1),
                    1 => Err(CoreError::Bridge {
                        message: "adb went away".into(),
                    }),
                    _ => std::future::pending().await,
                }
            }
            .boxed()
        };

        let mut producer = producer;
        poll_until(&cache, Some(1), &mut producer).await;
        // Wait for the failing refresh to be consumed and the third to start.
        for _ in 0..200 {
            if calls.load(Ordering::SeqCst) >= 3 {
                break;
            }
            assert_eq!(cache.poll(&mut producer).unwrap(), Some(1));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.poll(&mut producer).unwrap(), Some(1));
    }

    #[tokio::test]
    async fn cancelled_refresh_is_replaced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();

        assert_eq!(cache.poll(stuck(&calls)).unwrap(), None);
        cache.abort_handle().unwrap().abort();

        for _ in 0..200 {
            if calls.load(Ordering::SeqCst) == 2 {
                break;
            }
            assert_eq!(cache.poll(stuck(&calls)).unwrap(), None);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_pending());
    }

    #[tokio::test]
    async fn panicking_producer_is_treated_as_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache();
        let counter = Arc::clone(&calls);
        let mut producer = move || -> Refresh {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => panic!("producer blew up"),
                    1 => Ok(5),
                    _ => std::future::pending().await,
                }
            }
            .boxed()
        };

        poll_until(&cache, Some(5), &mut producer).await;
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn closed_result_with_running_task_stays_pending() {
        let (tx, rx) = oneshot::channel::<Result<u32, CoreError>>();
        drop(tx);
        let task = tokio::spawn(std::future::pending::<()>());

        let flight = Flight::Pending { result: rx, task }.settle("test").unwrap();
        assert!(matches!(flight, Flight::Pending { .. }));
    }

    #[tokio::test]
    async fn panic_after_sender_drop_settles_as_panicked() {
        let (tx, rx) = oneshot::channel::<Result<u32, CoreError>>();
        let task = tokio::spawn(async move {
            drop(tx);
            panic!("producer blew up");
        });

        let mut flight = Flight::Pending { result: rx, task };
        for _ in 0..200 {
            flight = flight.settle("test").unwrap();
            if !matches!(flight, Flight::Pending { .. }) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(matches!(
            flight,
            Flight::Ready(Err(CoreError::ProducerPanicked { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn poll_does_not_wait_for_a_slow_producer() {
        let cache = cache();
        let start = std::time::Instant::now();
        let value = cache
            .poll(|| -> Refresh {
                async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(1)
                }
                .boxed()
            })
            .unwrap();
        assert_eq!(value, None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
