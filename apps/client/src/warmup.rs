//! AI-subsystem warmup coordination, independent of backend reachability.
//!
//! The third-party AI provider behind the service has its own warm-up
//! latency. A definitive warm response settles the state at `Available`;
//! a non-definitive one keeps it `Warming` with a quick re-check; a
//! transport failure settles at `Unavailable` with a slower retry. Pending
//! follow-ups occupy a single cancellable slot so re-checks never pile up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::AnalysisApi;
use crate::status::{AiState, StatusCell};

const WARMING_RECHECK_DELAY: Duration = Duration::from_secs(5);
const UNAVAILABLE_RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug)]
enum Followup {
    QuickCheck,
    Warmup,
}

#[derive(Clone)]
pub struct WarmupCoordinator {
    api: Arc<dyn AnalysisApi>,
    status: StatusCell,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl WarmupCoordinator {
    pub fn new(api: Arc<dyn AnalysisApi>, status: StatusCell) -> Self {
        Self {
            api,
            status,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Kicks the AI provider awake. Called once the backend is ready, and
    /// again by the retry follow-up while the provider stays unavailable.
    pub async fn warmup(&self) {
        match self.status.ai() {
            AiState::Available => return,
            AiState::Idle | AiState::Unavailable => {
                self.status.set_ai(AiState::Checking);
            }
            AiState::Checking | AiState::Warming => {}
        }

        match self.api.warmup().await {
            Ok(resp) if resp.warmup_complete => {
                self.cancel_pending();
                self.status.set_ai(AiState::Available);
                self.status.set_model(resp.model_name());
                info!("AI provider is warm");
            }
            Ok(_) => {
                self.status.set_ai(AiState::Warming);
                debug!("AI provider still warming, scheduling quick re-check");
                self.schedule(WARMING_RECHECK_DELAY, Followup::QuickCheck);
            }
            Err(e) => {
                warn!(error = %e, "Warmup call failed");
                self.status.set_ai(AiState::Unavailable);
                self.schedule(UNAVAILABLE_RETRY_DELAY, Followup::Warmup);
            }
        }
    }

    /// Lightweight status poll. Used on demand and by the periodic
    /// status-check timer while the state is unsettled.
    pub async fn quick_check(&self) {
        match self.api.quick_check().await {
            Ok(resp) => {
                if resp.warmup_complete {
                    self.cancel_pending();
                    self.status.set_ai(AiState::Available);
                    self.status.set_model(resp.model_name());
                } else if !resp.available {
                    self.status.set_ai(AiState::Unavailable);
                } else {
                    self.status.set_ai(AiState::Warming);
                }
            }
            Err(e) => {
                // A cheap poll failing is not a verdict on the provider.
                debug!(error = %e, "Quick AI status check failed");
            }
        }
    }

    /// Marks the provider unavailable on an explicit quota/rate-limit
    /// signal from an analysis request.
    pub fn mark_unavailable(&self) {
        self.status.set_ai(AiState::Unavailable);
    }

    /// True while the periodic status-check timer should keep firing.
    pub fn is_unsettled(&self) -> bool {
        matches!(self.status.ai(), AiState::Checking | AiState::Warming)
    }

    pub fn shutdown(&self) {
        self.cancel_pending();
    }

    fn schedule(&self, delay: Duration, followup: Followup) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.pending.lock().expect("warmup slot poisoned").take();
            match followup {
                Followup::QuickCheck => this.quick_check().await,
                Followup::Warmup => this.warmup().await,
            }
        });
        let mut slot = self.pending.lock().expect("warmup slot poisoned");
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().expect("warmup slot poisoned").take() {
            handle.abort();
        }
    }
}
