//! Scripted fetch port for driving services in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::kind::MetricsKind;
use crate::port::{FetchError, FetchRequest, MetricsFetchPort};

#[derive(Debug)]
struct Reply<K: MetricsKind> {
    delay: Duration,
    result: Option<K::Snapshot>,
}

/// Answers fetches from a queue of canned replies; fails when the queue is empty.
#[derive(Debug)]
pub(crate) struct ScriptedPort<K: MetricsKind> {
    replies: Mutex<VecDeque<Reply<K>>>,
    requests: Mutex<Vec<FetchRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl<K: MetricsKind> ScriptedPort<K> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub(crate) fn reply_ok(&self, snapshot: K::Snapshot) {
        self.reply_ok_after(Duration::ZERO, snapshot);
    }

    pub(crate) fn reply_ok_after(&self, delay: Duration, snapshot: K::Snapshot) {
        self.replies.lock().push_back(Reply {
            delay,
            result: Some(snapshot),
        });
    }

    pub(crate) fn reply_err_after(&self, delay: Duration) {
        self.replies.lock().push_back(Reply {
            delay,
            result: None,
        });
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<K: MetricsKind> MetricsFetchPort<K> for ScriptedPort<K> {
    async fn fetch(&self, request: FetchRequest) -> Result<K::Snapshot, FetchError> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match reply {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => None,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result.ok_or_else(|| FetchError::new("scripted failure"))
    }
}
