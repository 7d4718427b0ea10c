//! Single authoritative progress value per analysis request.
//!
//! Two producers feed it while a request is active: a synthetic ramp
//! (modeling unknown server-side duration) and real transfer-progress events
//! from the upload body. Every proposal is merged with the current value via
//! `max()`, never overwritten, so the displayed value cannot regress no
//! matter which producer fires last.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

const RAMP_TICK: Duration = Duration::from_millis(500);
/// The synthetic ramp never claims more than this; only real completion may.
const RAMP_CEILING: f64 = 85.0;
const SETTLE_VALUE: f64 = 95.0;
const COMPLETE_VALUE: f64 = 100.0;
/// Hold at 95 before showing the terminal value.
const SETTLE_HOLD: Duration = Duration::from_millis(600);
/// Hold at the terminal value before resetting for the next request.
const DISPLAY_HOLD: Duration = Duration::from_millis(1500);

/// Transfer-phase remap: the upload's 0–100% maps into this sub-range of the
/// overall indicator, leaving headroom for server-side processing.
const SINGLE_TRANSFER_RANGE: (f64, f64) = (30.0, 70.0);
const BATCH_TRANSFER_RANGE: (f64, f64) = (10.0, 40.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Single,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Active,
    Succeeded,
    Failed,
}

#[derive(Debug)]
struct Inner {
    value: f64,
    status: RequestStatus,
    kind: RequestKind,
}

/// Cloneable handle to the active request's progress state.
#[derive(Clone)]
pub struct RequestProgress {
    inner: Arc<Mutex<Inner>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Default for RequestProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestProgress {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: 0.0,
                status: RequestStatus::Idle,
                kind: RequestKind::Single,
            })),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Starts tracking a new request: resets the value, marks the request
    /// active and spawns the synthetic ramp. Any leftover producer from a
    /// prior request is aborted first. Returns a fresh request id for log
    /// correlation.
    pub fn begin(&self, kind: RequestKind) -> Uuid {
        self.abort_tasks();
        let request_id = Uuid::new_v4();
        {
            let mut inner = self.inner.lock().expect("progress state poisoned");
            inner.value = 0.0;
            inner.status = RequestStatus::Active;
            inner.kind = kind;
        }
        self.spawn_ramp();
        debug!(%request_id, ?kind, "Progress tracking started");
        request_id
    }

    pub fn value(&self) -> f64 {
        self.inner.lock().expect("progress state poisoned").value
    }

    pub fn status(&self) -> RequestStatus {
        self.inner.lock().expect("progress state poisoned").status
    }

    pub fn is_active(&self) -> bool {
        self.status() == RequestStatus::Active
    }

    /// Merge rule: a proposal only ever raises the value, and only while the
    /// request is active. Late events from a producer that lost the race are
    /// absorbed silently.
    pub fn propose(&self, proposed: f64) {
        let mut inner = self.inner.lock().expect("progress state poisoned");
        if inner.status != RequestStatus::Active {
            return;
        }
        let clamped = proposed.clamp(0.0, 100.0);
        if clamped > inner.value {
            inner.value = clamped;
        }
    }

    /// Feeds a real transfer-progress event (0–100% of the transfer phase),
    /// remapped into the kind's sub-range of the overall indicator.
    pub fn on_transfer(&self, transfer_pct: f64) {
        let kind = self.inner.lock().expect("progress state poisoned").kind;
        let (lo, hi) = match kind {
            RequestKind::Single => SINGLE_TRANSFER_RANGE,
            RequestKind::Batch => BATCH_TRANSFER_RANGE,
        };
        let pct = transfer_pct.clamp(0.0, 100.0);
        self.propose(lo + (hi - lo) * pct / 100.0);
    }

    /// Records the outcome, stops the ramp, jumps to 95 and schedules the
    /// display tail: 100 on success after a short hold, then a reset to 0
    /// strictly after the outcome has been recorded and the hold elapsed.
    pub fn settle(&self, success: bool) {
        self.abort_tasks();
        {
            let mut inner = self.inner.lock().expect("progress state poisoned");
            if inner.status != RequestStatus::Active {
                return;
            }
            inner.status = if success {
                RequestStatus::Succeeded
            } else {
                RequestStatus::Failed
            };
            inner.value = SETTLE_VALUE;
        }

        let handle = {
            let this = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(SETTLE_HOLD).await;
                if success {
                    this.set_terminal(COMPLETE_VALUE);
                }
                tokio::time::sleep(DISPLAY_HOLD).await;
                this.reset();
            })
        };
        self.tasks.lock().expect("progress tasks poisoned").push(handle);
    }

    fn set_terminal(&self, value: f64) {
        let mut inner = self.inner.lock().expect("progress state poisoned");
        if inner.status == RequestStatus::Succeeded || inner.status == RequestStatus::Failed {
            inner.value = value;
        }
    }

    fn reset(&self) {
        let mut inner = self.inner.lock().expect("progress state poisoned");
        if inner.status == RequestStatus::Active {
            return; // a new request started during the hold; leave it alone
        }
        inner.value = 0.0;
        inner.status = RequestStatus::Idle;
    }

    fn spawn_ramp(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut jitter = XorShift::from_clock();
            loop {
                tokio::time::sleep(RAMP_TICK).await;
                if !this.is_active() {
                    break;
                }
                let increment = 1.0 + (jitter.next() % 8) as f64;
                let current = this.value();
                this.propose((current + increment).min(RAMP_CEILING));
            }
        });
        self.tasks.lock().expect("progress tasks poisoned").push(handle);
    }

    fn abort_tasks(&self) {
        let mut tasks = self.tasks.lock().expect("progress tasks poisoned");
        for handle in tasks.drain(..) {
            handle.abort();
        }
    }
}

/// Small xorshift generator for ramp jitter. Statistical quality is
/// irrelevant here; the increments only need to look uneven.
struct XorShift {
    state: u64,
}

impl XorShift {
    fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0x9e3779b9)
            | 1;
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}
