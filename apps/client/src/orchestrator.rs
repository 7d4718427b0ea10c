//! Upload orchestration: validates input, issues single and batch analysis
//! requests, drives the progress estimator, classifies failures and hands
//! successful results off to the navigation controller.
//!
//! Deliberately no automatic retry of a failed request: the user resubmits.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{AnalysisApi, FileUpload, TransferProgress};
use crate::api::models::{AnalysisResult, BatchResult};
use crate::errors::{ClientError, Result};
use crate::files::{FileRef, UploadBatch};
use crate::monitor::ServiceMonitor;
use crate::nav::NavigationController;
use crate::progress::{RequestKind, RequestProgress};
use crate::status::{BackendState, StatusCell};
use crate::warmup::WarmupCoordinator;

pub struct UploadOrchestrator {
    api: Arc<dyn AnalysisApi>,
    status: StatusCell,
    monitor: ServiceMonitor,
    warmup: WarmupCoordinator,
    progress: RequestProgress,
}

impl UploadOrchestrator {
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        status: StatusCell,
        monitor: ServiceMonitor,
        warmup: WarmupCoordinator,
    ) -> Self {
        Self {
            api,
            status,
            monitor,
            warmup,
            progress: RequestProgress::new(),
        }
    }

    pub fn progress(&self) -> &RequestProgress {
        &self.progress
    }

    /// Submits one resume against the job description. Preconditions are
    /// checked locally and fail fast with no network call.
    pub async fn submit_single(
        &self,
        file: &FileRef,
        job_description: &str,
        nav: &mut NavigationController,
    ) -> Result<AnalysisResult> {
        let description = validate_job_description(job_description)?;
        self.ensure_backend_ready()?;
        let upload = read_upload(file).await?;

        // Starting a new analysis clears any prior result state.
        nav.reset();
        let request_id = self.progress.begin(RequestKind::Single);
        info!(%request_id, file = %file.name, "Submitting single analysis");

        let result = self
            .api
            .analyze(upload, &description, self.transfer_sink())
            .await;

        match result {
            Ok(analysis) => {
                self.progress.settle(true);
                info!(%request_id, score = analysis.overall_score, "Analysis complete");
                nav.show_single(analysis.clone())
                    .map_err(|e| ClientError::Validation(e.to_string()))?;
                self.resync_after_success();
                Ok(analysis)
            }
            Err(e) => {
                self.progress.settle(false);
                Err(self.classify_failure(e, request_id))
            }
        }
    }

    /// Submits the accepted batch against the job description.
    pub async fn submit_batch(
        &self,
        batch: &UploadBatch,
        job_description: &str,
        nav: &mut NavigationController,
    ) -> Result<BatchResult> {
        if batch.is_empty() {
            return Err(ClientError::validation(
                "no resumes selected; add at least one file",
            ));
        }
        let description = validate_job_description(job_description)?;
        self.ensure_backend_ready()?;

        let mut uploads = Vec::with_capacity(batch.len());
        for file in batch.files() {
            uploads.push(read_upload(file).await?);
        }

        nav.reset();
        let request_id = self.progress.begin(RequestKind::Batch);
        info!(%request_id, files = batch.len(), "Submitting batch analysis");

        let result = self
            .api
            .analyze_batch(uploads, &description, self.transfer_sink())
            .await;

        match result {
            Ok(batch_result) => {
                self.progress.settle(true);
                info!(
                    %request_id,
                    successful = batch_result.successful,
                    failed = batch_result.failed,
                    "Batch analysis complete"
                );
                nav.show_batch(batch_result.clone())
                    .map_err(|e| ClientError::Validation(e.to_string()))?;
                self.resync_after_success();
                Ok(batch_result)
            }
            Err(e) => {
                self.progress.settle(false);
                Err(self.classify_failure(e, request_id))
            }
        }
    }

    fn transfer_sink(&self) -> TransferProgress {
        let progress = self.progress.clone();
        Arc::new(move |pct| progress.on_transfer(pct))
    }

    /// Preconditions require a ready backend. A sleeping backend gets a wake
    /// attempt kicked off in the background, but this request still fails
    /// fast; the user retries once the service is up.
    fn ensure_backend_ready(&self) -> Result<()> {
        match self.status.backend() {
            BackendState::Ready => Ok(()),
            BackendState::Waking => Err(ClientError::validation(
                "the analysis service is still waking up, please retry shortly",
            )),
            BackendState::Sleeping | BackendState::Unknown => {
                let monitor = self.monitor.clone();
                tokio::spawn(async move {
                    monitor.initialize().await;
                });
                Err(ClientError::validation(
                    "the analysis service is asleep; a wake-up has been started, please retry shortly",
                ))
            }
        }
    }

    /// Failure taxonomy: a timeout is sleeping-backend evidence and triggers
    /// an automatic wake; an explicit rate-limit signal marks the AI
    /// provider unavailable; everything else is surfaced as-is.
    fn classify_failure(&self, error: ClientError, request_id: uuid::Uuid) -> ClientError {
        match &error {
            ClientError::Timeout => {
                warn!(%request_id, "Analysis request timed out; backend presumed asleep");
                self.status.set_backend(BackendState::Sleeping);
                let monitor = self.monitor.clone();
                tokio::spawn(async move {
                    monitor.force_wake().await;
                });
            }
            ClientError::RateLimited(message) => {
                warn!(%request_id, message = %message, "AI provider rate limited");
                self.warmup.mark_unavailable();
            }
            other => {
                warn!(%request_id, error = %other, "Analysis request failed");
            }
        }
        error
    }

    /// Opportunistic status refresh once a request has succeeded: the
    /// backend clearly just did heavy work, so its reported key counts and
    /// model metadata are worth re-reading.
    fn resync_after_success(&self) {
        let monitor = self.monitor.clone();
        tokio::spawn(async move {
            monitor.sync_health().await;
        });
    }
}

fn validate_job_description(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::validation("job description must not be empty"));
    }
    Ok(trimmed.to_string())
}

async fn read_upload(file: &FileRef) -> Result<FileUpload> {
    let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
        ClientError::validation(format!("{}: file could not be read: {e}", file.name))
    })?;
    Ok(FileUpload {
        file_name: file.name.clone(),
        content_type: file.kind.content_type(),
        bytes,
    })
}
