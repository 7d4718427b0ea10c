//! Scripted `AnalysisApi` fake shared by the orchestration-core tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::api::models::{
    AnalysisResult, BatchResult, CandidateResult, HealthResponse, QuickCheckResponse,
    WarmupResponse,
};
use crate::api::{AnalysisApi, FileUpload, TransferProgress};
use crate::errors::{ClientError, Result};

/// Queue-scripted fake: each call pops the next scripted outcome for its
/// endpoint. Probe endpoints fall back to a success default when the queue
/// is empty; analysis endpoints fail loudly so tests always script them.
#[derive(Default)]
pub struct FakeApi {
    pub ping_results: Mutex<VecDeque<Result<()>>>,
    pub health_results: Mutex<VecDeque<Result<HealthResponse>>>,
    pub warmup_results: Mutex<VecDeque<Result<WarmupResponse>>>,
    pub quick_results: Mutex<VecDeque<Result<QuickCheckResponse>>>,
    pub analyze_results: Mutex<VecDeque<Result<AnalysisResult>>>,
    pub batch_results: Mutex<VecDeque<Result<BatchResult>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ping(&self, result: Result<()>) {
        self.ping_results.lock().unwrap().push_back(result);
    }

    pub fn push_health(&self, result: Result<HealthResponse>) {
        self.health_results.lock().unwrap().push_back(result);
    }

    pub fn push_warmup(&self, result: Result<WarmupResponse>) {
        self.warmup_results.lock().unwrap().push_back(result);
    }

    pub fn push_quick(&self, result: Result<QuickCheckResponse>) {
        self.quick_results.lock().unwrap().push_back(result);
    }

    pub fn push_analyze(&self, result: Result<AnalysisResult>) {
        self.analyze_results.lock().unwrap().push_back(result);
    }

    pub fn push_batch(&self, result: Result<BatchResult>) {
        self.batch_results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl AnalysisApi for FakeApi {
    async fn ping(&self) -> Result<()> {
        self.record("ping");
        self.ping_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn health(&self) -> Result<HealthResponse> {
        self.record("health");
        self.health_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HealthResponse::default()))
    }

    async fn warmup(&self) -> Result<WarmupResponse> {
        self.record("warmup");
        self.warmup_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WarmupResponse::default()))
    }

    async fn quick_check(&self) -> Result<QuickCheckResponse> {
        self.record("quick_check");
        self.quick_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QuickCheckResponse::default()))
    }

    async fn analyze(
        &self,
        _upload: FileUpload,
        _job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<AnalysisResult> {
        self.record("analyze");
        on_transfer(100.0);
        self.analyze_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ClientError::Server {
                    status: 500,
                    message: "unscripted analyze call".to_string(),
                })
            })
    }

    async fn analyze_batch(
        &self,
        _uploads: Vec<FileUpload>,
        _job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<BatchResult> {
        self.record("analyze_batch");
        on_transfer(100.0);
        self.batch_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ClientError::Server {
                    status: 500,
                    message: "unscripted batch call".to_string(),
                })
            })
    }

    async fn download_report(&self, _handle: &str) -> Result<Bytes> {
        self.record("download_report");
        Ok(Bytes::from_static(b"%PDF-fake"))
    }

    async fn download_individual(&self, _analysis_id: &str) -> Result<Bytes> {
        self.record("download_individual");
        Ok(Bytes::from_static(b"%PDF-fake"))
    }
}

pub fn sample_result(name: &str, score: u32) -> AnalysisResult {
    AnalysisResult {
        candidate_name: name.to_string(),
        overall_score: score,
        matched_skills: vec!["rust".to_string()],
        missing_skills: vec!["kubernetes".to_string()],
        experience_summary: Some("6 years of backend work".to_string()),
        education_summary: Some("BSc Computer Science".to_string()),
        strengths: vec!["systems design".to_string()],
        improvements: vec!["cloud certifications".to_string()],
        recommendation: Some("Proceed to interview".to_string()),
        report_handle: format!("rep-{score}"),
    }
}

pub fn sample_batch(scores: &[u32]) -> BatchResult {
    let candidates = scores
        .iter()
        .enumerate()
        .map(|(i, score)| CandidateResult {
            rank: i as u32 + 1,
            analysis_id: format!("a-{i}"),
            result: sample_result(&format!("Candidate {}", i + 1), *score),
        })
        .collect::<Vec<_>>();
    BatchResult {
        total: scores.len() as u32,
        successful: scores.len() as u32,
        failed: 0,
        candidates,
    }
}
