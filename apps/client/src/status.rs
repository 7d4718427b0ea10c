//! Process-wide service status: backend reachability and AI-subsystem
//! readiness, tracked independently.
//!
//! Mutation goes through the transition-enforcing update API below; an
//! illegal edge is rejected and logged, never applied. The cell is created
//! once in `main` and handed to the monitors and the poller; tests create
//! their own.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Backend reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    Unknown,
    Waking,
    Ready,
    Sleeping,
}

/// AI-subsystem readiness, independent of backend reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    Idle,
    Checking,
    Warming,
    Available,
    Unavailable,
}

pub const TOTAL_KEYS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub backend: BackendState,
    pub ai: AiState,
    pub available_keys: u32,
    pub total_keys: u32,
    pub model: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            backend: BackendState::Unknown,
            ai: AiState::Idle,
            available_keys: 0,
            total_keys: TOTAL_KEYS,
            model: None,
            last_synced: None,
        }
    }
}

/// Shared handle to the one `ServiceStatus` instance.
#[derive(Clone, Default)]
pub struct StatusCell {
    inner: Arc<Mutex<ServiceStatus>>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ServiceStatus {
        self.inner.lock().expect("status cell poisoned").clone()
    }

    pub fn backend(&self) -> BackendState {
        self.snapshot().backend
    }

    pub fn ai(&self) -> AiState {
        self.snapshot().ai
    }

    /// Applies a backend transition if it is a legal edge. Returns whether
    /// the transition was applied (a same-state update counts as applied).
    pub fn set_backend(&self, next: BackendState) -> bool {
        let mut status = self.inner.lock().expect("status cell poisoned");
        let current = status.backend;
        if current == next {
            return true;
        }
        if !backend_edge_allowed(current, next) {
            warn!(?current, ?next, "Rejected illegal backend transition");
            return false;
        }
        debug!(?current, ?next, "Backend transition");
        status.backend = next;
        true
    }

    /// Applies an AI-state transition if it is a legal edge. `Available`
    /// never regresses to `Warming` without an intervening `Unavailable`.
    pub fn set_ai(&self, next: AiState) -> bool {
        let mut status = self.inner.lock().expect("status cell poisoned");
        let current = status.ai;
        if current == next {
            return true;
        }
        if !ai_edge_allowed(current, next) {
            warn!(?current, ?next, "Rejected illegal AI-state transition");
            return false;
        }
        debug!(?current, ?next, "AI-state transition");
        status.ai = next;
        true
    }

    pub fn set_keys(&self, available: u32) {
        let mut status = self.inner.lock().expect("status cell poisoned");
        status.available_keys = available.min(status.total_keys);
    }

    pub fn set_model(&self, model: Option<String>) {
        if model.is_none() {
            return; // a probe that omits the model never erases a known one
        }
        self.inner.lock().expect("status cell poisoned").model = model;
    }

    pub fn mark_synced(&self) {
        self.inner.lock().expect("status cell poisoned").last_synced = Some(Utc::now());
    }
}

fn backend_edge_allowed(current: BackendState, next: BackendState) -> bool {
    use BackendState::*;
    matches!(
        (current, next),
        (Unknown, Waking) | (Waking, Ready) | (Waking, Sleeping) | (Ready, Sleeping) | (Sleeping, Waking)
    )
}

fn ai_edge_allowed(current: AiState, next: AiState) -> bool {
    use AiState::*;
    matches!(
        (current, next),
        (Idle, Checking)
            | (Checking, Warming)
            | (Checking, Available)
            | (Checking, Unavailable)
            | (Warming, Available)
            | (Warming, Unavailable)
            | (Available, Unavailable)
            | (Unavailable, Checking)
            | (Unavailable, Warming)
            | (Unavailable, Available)
    )
}
