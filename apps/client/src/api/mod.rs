//! API client: the single point of entry for all analysis-service HTTP calls.
//!
//! ARCHITECTURAL RULE: no other module may issue HTTP requests. Availability
//! monitoring, warmup coordination and upload orchestration all go through
//! the `AnalysisApi` trait so tests can substitute a scripted fake.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tracing::debug;

use crate::errors::{ClientError, Result};

pub mod models;

use models::{AnalysisResult, BatchResult, ErrorBody, HealthResponse, QuickCheckResponse, WarmupResponse};

const PING_TIMEOUT: Duration = Duration::from_secs(8);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
const WARMUP_TIMEOUT: Duration = Duration::from_secs(15);
const QUICK_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upload body chunk size. Small enough that transfer-progress events fire
/// steadily even for a 15 MiB file.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Callback receiving transfer progress as a percentage of the transfer
/// phase (0–100).
pub type TransferProgress = Arc<dyn Fn(f64) + Send + Sync>;

/// One file prepared for upload: validated name, resolved content type and
/// the full byte payload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The analysis-service API surface consumed by the orchestration core.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn ping(&self) -> Result<()>;
    async fn health(&self) -> Result<HealthResponse>;
    async fn warmup(&self) -> Result<WarmupResponse>;
    async fn quick_check(&self) -> Result<QuickCheckResponse>;
    async fn analyze(
        &self,
        upload: FileUpload,
        job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<AnalysisResult>;
    async fn analyze_batch(
        &self,
        uploads: Vec<FileUpload>,
        job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<BatchResult>;
    async fn download_report(&self, handle: &str) -> Result<Bytes>;
    async fn download_individual(&self, analysis_id: &str) -> Result<Bytes>;
}

/// Concrete HTTP client for the analysis service.
pub struct ApiClient {
    client: Client,
    base_url: String,
    analyze_timeout: Duration,
    batch_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: String, analyze_timeout: Duration, batch_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            analyze_timeout,
            batch_timeout,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_json<R>(&self, endpoint: &str, timeout: Duration) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(endpoint))
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        Ok(response.json::<R>().await.map_err(map_transport)?)
    }

    async fn get_bytes(&self, endpoint: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(self.url(endpoint))
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        Ok(response.bytes().await.map_err(map_transport)?)
    }
}

#[async_trait]
impl AnalysisApi for ApiClient {
    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("/ping"))
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map_err(map_transport)?;
        check_status(response).await?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/health", HEALTH_TIMEOUT).await
    }

    async fn warmup(&self) -> Result<WarmupResponse> {
        self.get_json("/warmup", WARMUP_TIMEOUT).await
    }

    async fn quick_check(&self) -> Result<QuickCheckResponse> {
        self.get_json("/quick-check", QUICK_CHECK_TIMEOUT).await
    }

    async fn analyze(
        &self,
        upload: FileUpload,
        job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<AnalysisResult> {
        let total_bytes = upload.bytes.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));

        let form = Form::new()
            .part("resume", progress_part(upload, sent, total_bytes, on_transfer)?)
            .text("jobDescription", job_description.to_string());

        debug!(endpoint = "/analyze", total_bytes, "Submitting single analysis");

        let response = self
            .client
            .post(self.url("/analyze"))
            .multipart(form)
            .timeout(self.analyze_timeout)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        Ok(response.json().await.map_err(map_transport)?)
    }

    async fn analyze_batch(
        &self,
        uploads: Vec<FileUpload>,
        job_description: &str,
        on_transfer: TransferProgress,
    ) -> Result<BatchResult> {
        let total_bytes: u64 = uploads.iter().map(|u| u.bytes.len() as u64).sum();
        let sent = Arc::new(AtomicU64::new(0));

        let mut form = Form::new().text("jobDescription", job_description.to_string());
        for upload in uploads {
            form = form.part(
                "resumes",
                progress_part(upload, Arc::clone(&sent), total_bytes, Arc::clone(&on_transfer))?,
            );
        }

        debug!(endpoint = "/analyze-batch", total_bytes, "Submitting batch analysis");

        let response = self
            .client
            .post(self.url("/analyze-batch"))
            .multipart(form)
            .timeout(self.batch_timeout)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response).await?;
        Ok(response.json().await.map_err(map_transport)?)
    }

    async fn download_report(&self, handle: &str) -> Result<Bytes> {
        self.get_bytes(&format!("/download/{handle}")).await
    }

    async fn download_individual(&self, analysis_id: &str) -> Result<Bytes> {
        self.get_bytes(&format!("/download-individual/{analysis_id}")).await
    }
}

/// Builds a multipart file part whose body reports cumulative transfer
/// progress as its chunks are consumed by the transport.
fn progress_part(
    upload: FileUpload,
    sent: Arc<AtomicU64>,
    total_bytes: u64,
    on_transfer: TransferProgress,
) -> Result<Part> {
    let content_length = upload.bytes.len() as u64;
    let chunks: Vec<Bytes> = upload
        .bytes
        .chunks(UPLOAD_CHUNK_BYTES)
        .map(Bytes::copy_from_slice)
        .collect();

    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, std::io::Error>)).inspect(
        move |chunk| {
            if let Ok(chunk) = chunk {
                let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
                if total_bytes > 0 {
                    on_transfer(done as f64 * 100.0 / total_bytes as f64);
                }
            }
        },
    );

    Part::stream_with_length(Body::wrap_stream(stream), content_length)
        .file_name(upload.file_name)
        .mime_str(upload.content_type)
        .map_err(ClientError::Http)
}

/// Maps a transport-level failure: exceeding the timeout is evidence of a
/// sleeping backend, everything else stays a plain network error.
fn map_transport(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(e)
    }
}

/// Converts a non-success response into the error taxonomy: an explicit
/// rate-limit/quota signal beats the generic server error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "the analysis service returned an unexpected error".to_string()
            } else {
                body.clone()
            }
        });

    if status.as_u16() == 429 || is_rate_limit_signal(&message) {
        Err(ClientError::RateLimited(message))
    } else {
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

fn is_rate_limit_signal(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("quota")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_rate_limit_signal_detection() {
        assert!(is_rate_limit_signal("API quota exceeded"));
        assert!(is_rate_limit_signal("Rate limit hit, retry later"));
        assert!(!is_rate_limit_signal("resume could not be parsed"));
    }

    #[tokio::test]
    async fn test_progress_stream_reports_monotonic_cumulative_percent() {
        let upload = FileUpload {
            file_name: "resume.pdf".to_string(),
            content_type: "application/pdf",
            bytes: vec![0u8; UPLOAD_CHUNK_BYTES * 3 + 17],
        };
        let total = upload.bytes.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let on_transfer: TransferProgress = Arc::new(move |pct| {
            seen_clone.lock().unwrap().push(pct);
        });

        // Drive the same stream progress_part wraps, without the multipart framing.
        let chunks: Vec<Bytes> = upload
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(Bytes::copy_from_slice)
            .collect();
        let stream =
            futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, std::io::Error>)).inspect(
                move |chunk| {
                    if let Ok(chunk) = chunk {
                        let done =
                            sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
                        on_transfer(done as f64 * 100.0 / total as f64);
                    }
                },
            );
        let _collected: Vec<_> = stream.collect().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!((seen.last().unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_never_divides() {
        let sent = Arc::new(AtomicU64::new(0));
        let on_transfer: TransferProgress = Arc::new(|_| panic!("must not fire for empty upload"));
        let upload = FileUpload {
            file_name: "empty.txt".to_string(),
            content_type: "text/plain",
            bytes: Vec::new(),
        };
        // Building the part for an empty payload must not invoke the callback.
        let part = progress_part(upload, sent, 0, on_transfer);
        assert!(part.is_ok());
    }
}
