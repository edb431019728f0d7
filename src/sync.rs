//! The polling data-synchronization core.
//!
//! Each dashboard view owns one [`SnapshotCell`] and at most one live
//! [`PollHandle`]. A poller issues an immediate fetch on start, then one per
//! period. Every fetch is tagged with a sequence number taken from the cell;
//! only a response whose sequence is still the latest issued may be applied,
//! so a slow early response can never overwrite newer data, and a response
//! that lands after cancellation is a no-op.
//!
//! Failure semantics: the previous snapshot is kept, the loading flag is
//! cleared, and the failure is logged. No retry; the next tick is an
//! independent attempt.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::logging::{json_log, obj, v_num, v_str};

/// Outcome of handing a fetch result to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Payload replaced the snapshot.
    Fresh,
    /// Fetch failed; previous snapshot kept, loading cleared.
    Failed,
    /// Sequence was superseded; result discarded untouched.
    Stale,
}

struct CellState<T> {
    data: Option<T>,
    loading: bool,
    failures: u64,
}

/// Latest successfully fetched payload for one view, plus the loading flag
/// and the sequence counter that serializes competing responses.
pub struct SnapshotCell<T> {
    label: &'static str,
    issued: Arc<AtomicU64>,
    state: Arc<Mutex<CellState<T>>>,
}

impl<T> Clone for SnapshotCell<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            issued: self.issued.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> SnapshotCell<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            issued: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(CellState {
                data: None,
                loading: true,
                failures: 0,
            })),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Reserve the next sequence number. The returned value stays valid until
    /// the next `issue` or `invalidate` call.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Invalidate all outstanding sequence numbers without issuing a fetch.
    pub fn invalidate(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
    }

    pub fn apply(&self, seq: u64, result: Result<T>) -> Applied {
        if seq != self.issued.load(Ordering::SeqCst) {
            json_log(
                "fetch",
                obj(&[
                    ("view", v_str(self.label)),
                    ("event", v_str("stale_response_discarded")),
                    ("seq", v_num(seq as f64)),
                ]),
            );
            return Applied::Stale;
        }
        let Ok(mut st) = self.state.lock() else {
            return Applied::Stale;
        };
        st.loading = false;
        match result {
            Ok(payload) => {
                st.data = Some(payload);
                Applied::Fresh
            }
            Err(err) => {
                st.failures += 1;
                json_log(
                    "fetch",
                    obj(&[
                        ("view", v_str(self.label)),
                        ("event", v_str("tick_failed")),
                        ("error", v_str(&err.to_string())),
                        ("failures", v_num(st.failures as f64)),
                    ]),
                );
                Applied::Failed
            }
        }
    }

    /// True until the first tick completes, success or failure. Never reset
    /// by later ticks.
    pub fn is_loading(&self) -> bool {
        self.state.lock().map(|st| st.loading).unwrap_or(false)
    }

    pub fn failures(&self) -> u64 {
        self.state.lock().map(|st| st.failures).unwrap_or(0)
    }
}

impl<T: Clone> SnapshotCell<T> {
    pub fn get(&self) -> Option<T> {
        self.state.lock().ok().and_then(|st| st.data.clone())
    }
}

/// Owner of one live poll timer. Dropping (or `cancel`ing) aborts the timer
/// and invalidates outstanding sequence numbers, so an in-flight response can
/// still complete on the wire but will be discarded on arrival.
pub struct PollHandle {
    task: JoinHandle<()>,
    issued: Arc<AtomicU64>,
}

impl PollHandle {
    /// Cancel the timer. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.issued.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Poller;

impl Poller {
    /// Start polling into `cell`: one immediate fetch, then one per `period`.
    /// Fetches run detached from the timer loop, mirroring a network call
    /// that outlives its page; the sequence check keeps late arrivals out.
    pub fn start<T, F, Fut>(cell: SnapshotCell<T>, period: Duration, fetch: F) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let issued = cell.issued.clone();
        json_log(
            "poll",
            obj(&[
                ("view", v_str(cell.label)),
                ("event", v_str("started")),
                ("period_ms", v_num(period.as_millis() as f64)),
            ]),
        );
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let seq = cell.issue();
                let fut = fetch();
                let apply_cell = cell.clone();
                tokio::spawn(async move {
                    let result = fut.await;
                    apply_cell.apply(seq, result);
                });
            }
        });
        PollHandle { task, issued }
    }
}
