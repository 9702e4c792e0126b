//! Serialized request queue enforcing a minimum interval between dispatches.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Default spacing between two API requests.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// A queued request, type-erased.
trait Job: Send {
    /// The caller stopped waiting for the output.
    fn is_abandoned(&self) -> bool;
    fn start(self: Box<Self>) -> BoxFuture<'static, ()>;
}

struct QueuedTask<F, T> {
    task: F,
    reply: oneshot::Sender<T>,
}

impl<F, Fut, T> Job for QueuedTask<F, T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    fn start(self: Box<Self>) -> BoxFuture<'static, ()> {
        let QueuedTask { task, reply } = *self;
        Box::pin(async move {
            let _ = reply.send(task().await);
        })
    }
}

struct QueueState {
    pending: VecDeque<Box<dyn Job>>,
    draining: bool,
    last_completed: Option<Instant>,
}

struct Inner {
    interval: Duration,
    state: Mutex<QueueState>,
}

/// FIFO queue that runs one request at a time.
///
/// Clones share the same backlog, so every API call made through any clone is
/// spaced at least `interval` after the completion of the previous one. The
/// backlog is unbounded; callers are expected to pace their own submissions.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

impl RequestQueue {
    /// Create a queue with the given minimum spacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                interval,
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    draining: false,
                    last_completed: None,
                }),
            }),
        }
    }

    /// Minimum spacing between dispatches.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Number of requests waiting to be dispatched.
    pub async fn pending(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Queue a request and wait for its output.
    ///
    /// The task is not started until every previously queued task has
    /// completed and the interval has elapsed. An error or panic inside one
    /// task only affects that task's caller. If the returned future is
    /// dropped before the task starts, the task is never run.
    pub async fn enqueue<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Box<dyn Job> = Box::new(QueuedTask { task, reply });

        let start_drain = {
            let mut state = self.inner.state.lock().await;
            state.pending.push_back(job);
            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }

        rx.await.map_err(|_| Error::QueueClosed)
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

/// Single drain worker; exits once the backlog is empty.
async fn drain(inner: Arc<Inner>) {
    loop {
        let (job, not_before) = {
            let mut state = inner.state.lock().await;
            match state.pending.pop_front() {
                Some(job) => (job, state.last_completed.map(|t| t + inner.interval)),
                None => {
                    state.draining = false;
                    return;
                }
            }
        };

        if let Some(deadline) = not_before {
            tokio::time::sleep_until(deadline).await;
        }

        if job.is_abandoned() {
            tracing::debug!("Dropping queued request, caller is gone");
            continue;
        }

        // A panicking task drops its sender; the caller sees QueueClosed.
        if let Err(e) = tokio::spawn(job.start()).await {
            tracing::warn!("Queued request aborted: {}", e);
        }

        inner.state.lock().await.last_completed = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use futures::future::join_all;
    use tokio_test::{assert_err, assert_ok};

    const INTERVAL: Duration = Duration::from_millis(40);

    #[tokio::test]
    async fn test_fifo_order_and_spacing() {
        let queue = RequestQueue::new(INTERVAL);
        let log = Arc::new(StdMutex::new(Vec::new()));

        let calls = (0..5).map(|i| {
            let log = Arc::clone(&log);
            queue.enqueue(move || async move {
                log.lock().unwrap().push((i, Instant::now()));
                i * 10
            })
        });
        let results = join_all(calls).await;

        let results: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(results, vec![0, 10, 20, 30, 40]);

        let log = log.lock().unwrap();
        let order: Vec<i32> = log.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        for pair in log.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= INTERVAL);
        }
    }

    #[tokio::test]
    async fn test_idle_queue_dispatches_immediately() {
        let queue = RequestQueue::new(Duration::from_secs(5));
        let started = Instant::now();
        assert_ok!(queue.enqueue(|| async {}).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacing_holds_across_drains() {
        let queue = RequestQueue::new(INTERVAL);
        let first = queue.enqueue(|| async { Instant::now() }).await.unwrap();
        // The drain loop has exited by now; the next request starts a new one.
        tokio::task::yield_now().await;
        let second = queue.enqueue(|| async { Instant::now() }).await.unwrap();
        assert!(second - first >= INTERVAL);
    }

    #[tokio::test]
    async fn test_failure_only_rejects_its_own_request() {
        let queue = RequestQueue::new(Duration::from_millis(1));

        let failing = queue.enqueue(|| async { Err::<u32, String>("boom".into()) });
        let panicking = queue.enqueue(|| async {
            if true {
                panic!("transport exploded");
            }
        });
        let ok = queue.enqueue(|| async { Ok::<u32, String>(7) });

        let (failing, panicking, ok) = tokio::join!(failing, panicking, ok);
        assert_err!(failing.unwrap());
        assert!(matches!(panicking, Err(Error::QueueClosed)));
        assert_eq!(ok.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_abandoned_request_is_not_run() {
        let queue = RequestQueue::new(Duration::from_millis(100));
        let runs = Arc::new(StdMutex::new(Vec::new()));

        let record = |name: &'static str| {
            let runs = Arc::clone(&runs);
            move || async move { runs.lock().unwrap().push(name) }
        };

        assert_ok!(queue.enqueue(record("first")).await);
        // Gives up while the queue is still waiting out the interval.
        let dropped = queue.enqueue(record("dropped"));
        assert_err!(tokio::time::timeout(Duration::from_millis(10), dropped).await);
        assert_ok!(queue.enqueue(record("last")).await);

        assert_eq!(*runs.lock().unwrap(), vec!["first", "last"]);
        assert_eq!(queue.pending().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_producers_share_one_worker() {
        let queue = RequestQueue::new(Duration::from_millis(10));
        let in_flight = Arc::new(StdMutex::new((0usize, 0usize)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                for _ in 0..3 {
                    let in_flight = Arc::clone(&in_flight);
                    queue
                        .enqueue(move || async move {
                            {
                                let mut guard = in_flight.lock().unwrap();
                                guard.0 += 1;
                                guard.1 = guard.1.max(guard.0);
                            }
                            tokio::time::sleep(Duration::from_millis(2)).await;
                            in_flight.lock().unwrap().0 -= 1;
                        })
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(in_flight.lock().unwrap().1, 1);
        assert_eq!(queue.pending().await, 0);
    }
}
