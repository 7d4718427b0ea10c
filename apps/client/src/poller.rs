//! Background polling: named interval tasks, centrally registered and
//! uniformly cancellable so no timer can leak past process shutdown.
//!
//! Three tasks run for the process lifetime: a keep-alive ping, a full
//! health refresh, and a conditional AI status re-check that only fires
//! while the warmup coordinator is unsettled.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::monitor::ServiceMonitor;
use crate::warmup::WarmupCoordinator;

pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(180);
pub const HEALTH_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const AI_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

type PollFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// One registered interval task: fires `action` every `interval` while
/// `guard` holds.
pub struct PollTask {
    name: &'static str,
    interval: Duration,
    guard: Box<dyn Fn() -> bool + Send + Sync>,
    action: Box<dyn Fn() -> PollFuture + Send + Sync>,
}

impl PollTask {
    pub fn new<G, A>(name: &'static str, interval: Duration, guard: G, action: A) -> Self
    where
        G: Fn() -> bool + Send + Sync + 'static,
        A: Fn() -> PollFuture + Send + Sync + 'static,
    {
        Self {
            name,
            interval,
            guard: Box::new(guard),
            action: Box::new(action),
        }
    }
}

/// Owns every background timer handle. Dropping without `shutdown()` would
/// leave the tasks running, so `main` holds it until teardown.
pub struct HealthPoller {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl HealthPoller {
    pub fn start(tasks: Vec<PollTask>) -> Self {
        let handles = tasks
            .into_iter()
            .map(|task| {
                let name = task.name;
                info!(task = name, interval_secs = task.interval.as_secs(), "Poll task registered");
                (name, spawn_poll_task(task))
            })
            .collect();
        Self { handles }
    }

    /// The process-lifetime task set: keep-alive, health refresh, and the
    /// guarded AI status re-check.
    pub fn standard_tasks(monitor: ServiceMonitor, warmup: WarmupCoordinator) -> Vec<PollTask> {
        let keep_alive = {
            let monitor = monitor.clone();
            PollTask::new("keep-alive", KEEP_ALIVE_INTERVAL, || true, move || {
                let monitor = monitor.clone();
                Box::pin(async move { monitor.keep_alive().await }) as PollFuture
            })
        };

        let health_refresh = {
            let monitor = monitor.clone();
            PollTask::new("health-refresh", HEALTH_REFRESH_INTERVAL, || true, move || {
                let monitor = monitor.clone();
                Box::pin(async move { monitor.sync_health().await }) as PollFuture
            })
        };

        let ai_recheck = {
            let guard_warmup = warmup.clone();
            PollTask::new(
                "ai-status-check",
                AI_RECHECK_INTERVAL,
                move || guard_warmup.is_unsettled(),
                move || {
                    let warmup = warmup.clone();
                    Box::pin(async move { warmup.quick_check().await }) as PollFuture
                },
            )
        };

        vec![keep_alive, health_refresh, ai_recheck]
    }

    /// Aborts every registered task. Called exactly once at teardown.
    pub fn shutdown(self) {
        for (name, handle) in self.handles {
            debug!(task = name, "Poll task cancelled");
            handle.abort();
        }
    }

    pub fn task_count(&self) -> usize {
        self.handles.len()
    }
}

fn spawn_poll_task(task: PollTask) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(task.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately; the
        // startup path already did this work, so skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            if !(task.guard)() {
                continue;
            }
            (task.action)().await;
        }
    })
}
