mod api;
mod cli;
mod config;
mod errors;
mod files;
mod monitor;
mod nav;
mod orchestrator;
mod poller;
mod progress;
mod status;
#[cfg(test)]
mod testutil;
mod warmup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::models::CandidateResult;
use crate::api::{AnalysisApi, ApiClient};
use crate::cli::{resolve_job_description, Cli, Command};
use crate::config::Config;
use crate::files::{FileRef, UploadBatch};
use crate::monitor::ServiceMonitor;
use crate::nav::{NavigationController, View};
use crate::orchestrator::UploadOrchestrator;
use crate::poller::HealthPoller;
use crate::status::{BackendState, StatusCell};
use crate::warmup::WarmupCoordinator;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting analysis client v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.service_url
    );

    let api: Arc<dyn AnalysisApi> = Arc::new(ApiClient::new(
        config.service_url.clone(),
        Duration::from_secs(config.analyze_timeout_secs),
        Duration::from_secs(config.batch_timeout_secs),
    )?);

    let status = StatusCell::new();
    let monitor = ServiceMonitor::new(Arc::clone(&api), status.clone());
    let warmup = WarmupCoordinator::new(Arc::clone(&api), status.clone());

    // Wake the backend, then start warming the AI provider behind it.
    monitor.initialize().await;
    if status.backend() == BackendState::Ready {
        warmup.warmup().await;
    }

    let poller = HealthPoller::start(HealthPoller::standard_tasks(monitor.clone(), warmup.clone()));
    info!(tasks = poller.task_count(), "Background polling started");

    let outcome = run_command(cli.command, &api, &status, &monitor, &warmup).await;

    // Teardown: no timer or pending retry may outlive the process.
    poller.shutdown();
    monitor.shutdown();
    warmup.shutdown();

    outcome
}

async fn run_command(
    command: Command,
    api: &Arc<dyn AnalysisApi>,
    status: &StatusCell,
    monitor: &ServiceMonitor,
    warmup: &WarmupCoordinator,
) -> Result<()> {
    match command {
        Command::Analyze {
            resume,
            job_description,
            job_description_file,
        } => {
            let description = resolve_job_description(job_description, job_description_file)?;
            let file = FileRef::from_path(&resume).map_err(|e| anyhow::anyhow!(e.to_string()))?;

            let orchestrator = UploadOrchestrator::new(
                Arc::clone(api),
                status.clone(),
                monitor.clone(),
                warmup.clone(),
            );
            let mut nav = NavigationController::new();

            let reporter = spawn_progress_reporter(&orchestrator);
            let submitted = orchestrator
                .submit_single(&file, &description, &mut nav)
                .await;
            reporter.abort();
            submitted?;

            render(&nav);
            Ok(())
        }
        Command::Batch {
            resumes,
            job_description,
            job_description_file,
            detail,
        } => {
            let description = resolve_job_description(job_description, job_description_file)?;

            let mut batch = UploadBatch::new();
            let report = batch.add_all(resumes.iter().map(|p| FileRef::from_path(p)));
            for rejection in &report.rejections {
                eprintln!("rejected {rejection}");
            }
            info!(
                accepted = report.accepted,
                rejected = report.rejections.len(),
                "Batch assembled"
            );

            let orchestrator = UploadOrchestrator::new(
                Arc::clone(api),
                status.clone(),
                monitor.clone(),
                warmup.clone(),
            );
            let mut nav = NavigationController::new();

            let reporter = spawn_progress_reporter(&orchestrator);
            let submitted = orchestrator.submit_batch(&batch, &description, &mut nav).await;
            reporter.abort();
            submitted?;

            render(&nav);

            if let Some(index) = detail {
                nav.select_candidate(index)
                    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
                render(&nav);
                nav.back().map_err(|e| anyhow::anyhow!(e.to_string()))?;
            }
            Ok(())
        }
        Command::Status => {
            if monitor.probe().await {
                monitor.sync_health().await;
            }
            print_status(status);
            Ok(())
        }
        Command::Download {
            handle,
            analysis_id,
            output,
        } => {
            let bytes = match (handle, analysis_id) {
                (Some(handle), _) => api.download_report(&handle).await?,
                (None, Some(id)) => api.download_individual(&id).await?,
                (None, None) => {
                    anyhow::bail!("provide either --handle or --analysis-id")
                }
            };
            write_report(&output, &bytes).await?;
            println!("Report written to {}", output.display());
            Ok(())
        }
    }
}

/// Logs the blended progress value twice a second while a request is active.
fn spawn_progress_reporter(orchestrator: &UploadOrchestrator) -> tokio::task::JoinHandle<()> {
    let progress = orchestrator.progress().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        interval.tick().await;
        loop {
            interval.tick().await;
            if !progress.is_active() {
                continue;
            }
            info!(percent = progress.value() as u32, "Analyzing");
        }
    })
}

async fn write_report(path: &PathBuf, bytes: &[u8]) -> Result<()> {
    use anyhow::Context;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn render(nav: &NavigationController) {
    match nav.view() {
        View::Main => println!("No results yet."),
        View::SingleResults => {
            if let Some(result) = nav.single_result() {
                println!("\nCandidate: {}", result.candidate_name);
                println!(
                    "Score:     {} / 100 ({})",
                    result.overall_score,
                    result.tier().label()
                );
                print_list("Matched skills", &result.matched_skills);
                print_list("Missing skills", &result.missing_skills);
                if let Some(experience) = &result.experience_summary {
                    println!("Experience: {experience}");
                }
                if let Some(education) = &result.education_summary {
                    println!("Education:  {education}");
                }
                print_list("Strengths", &result.strengths);
                print_list("Improvements", &result.improvements);
                if let Some(recommendation) = &result.recommendation {
                    println!("Recommendation: {recommendation}");
                }
                println!("Report handle:  {}", result.report_handle);
            }
        }
        View::BatchResults => {
            if let Some(batch) = nav.batch_result() {
                println!(
                    "\nBatch: {} analyzed, {} successful, {} failed",
                    batch.total, batch.successful, batch.failed
                );
                for candidate in &batch.candidates {
                    println!(
                        "  #{:<2} {:<30} {:>3} / 100 ({})  [{}]",
                        candidate.rank,
                        candidate.result.candidate_name,
                        candidate.result.overall_score,
                        candidate.result.tier().label(),
                        candidate.analysis_id
                    );
                }
            }
        }
        View::CandidateDetail => {
            if let Some((positional_rank, candidate)) = nav.selected_candidate() {
                print_candidate_detail(positional_rank, candidate);
            }
        }
    }
}

fn print_candidate_detail(positional_rank: usize, candidate: &CandidateResult) {
    println!("\nRank {positional_rank}: {}", candidate.result.candidate_name);
    println!(
        "Score: {} / 100 ({})",
        candidate.result.overall_score,
        candidate.result.tier().label()
    );
    print_list("Matched skills", &candidate.result.matched_skills);
    print_list("Missing skills", &candidate.result.missing_skills);
    if let Some(recommendation) = &candidate.result.recommendation {
        println!("Recommendation: {recommendation}");
    }
    println!("Analysis id: {} (use `download --analysis-id`)", candidate.analysis_id);
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{label}:");
    for item in items {
        println!("  - {item}");
    }
}

fn print_status(status: &StatusCell) {
    let snapshot = status.snapshot();
    println!("Backend:        {:?}", snapshot.backend);
    println!("AI provider:    {:?}", snapshot.ai);
    println!(
        "API keys:       {} of {} available",
        snapshot.available_keys, snapshot.total_keys
    );
    match &snapshot.model {
        Some(model) => println!("Model:          {model}"),
        None => println!("Model:          (unknown)"),
    }
    match &snapshot.last_synced {
        Some(at) => println!("Last synced:    {at}"),
        None => println!("Last synced:    never"),
    }
}
