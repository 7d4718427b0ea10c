//! Backend availability monitor: wake sequencing, liveness probing and the
//! fixed-delay wake retry.
//!
//! The backend may be suspended and slow to resume. A wake attempt is a
//! liveness ping followed by a richer health probe; both must succeed before
//! the backend is considered ready. A failed attempt is retried once within
//! the sequence, then the monitor falls back to `Sleeping` and schedules a
//! whole-sequence retry that stays cancellable so a later successful wake
//! can never race a stale one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::models::HealthResponse;
use crate::api::AnalysisApi;
use crate::status::{AiState, BackendState, StatusCell};

/// Delay before re-running a failed wake sequence. Fixed on purpose: the
/// periodic health refresh is the slow path, this retry only has to beat it.
const WAKE_RETRY_DELAY: Duration = Duration::from_secs(15);
/// Pause between the two in-sequence wake attempts.
const WAKE_ATTEMPT_PAUSE: Duration = Duration::from_secs(2);
const WAKE_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct ServiceMonitor {
    api: Arc<dyn AnalysisApi>,
    status: StatusCell,
    retry: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ServiceMonitor {
    pub fn new(api: Arc<dyn AnalysisApi>, status: StatusCell) -> Self {
        Self {
            api,
            status,
            retry: Arc::new(Mutex::new(None)),
        }
    }

    /// Begins the wake sequence. Idempotent: a monitor that is already
    /// waking or ready does nothing.
    pub async fn initialize(&self) {
        match self.status.backend() {
            BackendState::Waking | BackendState::Ready => return,
            BackendState::Unknown | BackendState::Sleeping => {}
        }
        self.status.set_backend(BackendState::Waking);
        self.run_wake_sequence().await;
    }

    /// Cancels any scheduled retry and immediately re-attempts the wake.
    pub async fn force_wake(&self) {
        self.cancel_retry();
        self.status.set_backend(BackendState::Waking);
        self.run_wake_sequence().await;
    }

    /// One liveness probe. A failure while ready demotes the backend to
    /// sleeping. Returns whether the probe succeeded.
    pub async fn probe(&self) -> bool {
        match self.api.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Liveness probe failed");
                if self.status.backend() == BackendState::Ready {
                    self.status.set_backend(BackendState::Sleeping);
                }
                false
            }
        }
    }

    /// Fire-and-forget keep-alive ping; failures are logged only.
    pub async fn keep_alive(&self) {
        if let Err(e) = self.api.ping().await {
            debug!(error = %e, "Keep-alive ping failed");
        }
    }

    /// Full health refresh: re-syncs backend state, key counts and model
    /// metadata from `/health`.
    pub async fn sync_health(&self) {
        match self.api.health().await {
            Ok(health) => {
                if self.status.backend() != BackendState::Ready {
                    // A reachable health endpoint means the backend is up,
                    // whatever we believed before.
                    self.status.set_backend(BackendState::Waking);
                    self.status.set_backend(BackendState::Ready);
                }
                self.apply_health(&health);
            }
            Err(e) => {
                debug!(error = %e, "Health refresh failed");
                if self.status.backend() == BackendState::Ready {
                    self.status.set_backend(BackendState::Sleeping);
                }
            }
        }
    }

    /// Releases the pending retry, if any. Called at process teardown so no
    /// wake attempt outlives the process.
    pub fn shutdown(&self) {
        self.cancel_retry();
    }

    async fn run_wake_sequence(&self) {
        for attempt in 1..=WAKE_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(WAKE_ATTEMPT_PAUSE).await;
            }
            match self.try_wake().await {
                Ok(health) => {
                    self.cancel_retry();
                    self.status.set_backend(BackendState::Ready);
                    self.apply_health(&health);
                    info!(attempt, "Backend is awake");
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Wake attempt failed");
                }
            }
        }
        self.status.set_backend(BackendState::Sleeping);
        self.schedule_retry();
    }

    async fn try_wake(&self) -> crate::errors::Result<HealthResponse> {
        self.api.ping().await?;
        self.api.health().await
    }

    fn apply_health(&self, health: &HealthResponse) {
        if let Some(keys) = health.available_keys {
            self.status.set_keys(keys);
        }
        self.status.set_model(health.model_name());
        if health.ai_warmup_complete == Some(true) {
            if self.status.ai() == AiState::Idle {
                self.status.set_ai(AiState::Checking);
            }
            self.status.set_ai(AiState::Available);
        }
        self.status.mark_synced();
    }

    fn schedule_retry(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(WAKE_RETRY_DELAY).await;
            // Clear our own slot without aborting: the handle in it is us.
            this.retry.lock().expect("retry slot poisoned").take();
            debug!("Re-running wake sequence after fixed delay");
            this.status.set_backend(BackendState::Waking);
            this.run_wake_sequence().await;
        });
        let mut slot = self.retry.lock().expect("retry slot poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
        debug!(delay_secs = WAKE_RETRY_DELAY.as_secs(), "Scheduled wake retry");
    }

    fn cancel_retry(&self) {
        if let Some(handle) = self.retry.lock().expect("retry slot poisoned").take() {
            handle.abort();
        }
    }
}
