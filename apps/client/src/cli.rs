use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "client",
    version,
    about = "Resume screening client for the remote analysis service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a single resume against a job description
    Analyze {
        /// Path to the resume document (pdf, doc, docx or txt, up to 15 MiB)
        #[arg(long)]
        resume: PathBuf,
        /// Job description text, inline
        #[arg(long, conflicts_with = "job_description_file")]
        job_description: Option<String>,
        /// Read the job description from a file instead
        #[arg(long)]
        job_description_file: Option<PathBuf>,
    },
    /// Analyze up to 10 resumes and rank the candidates
    Batch {
        /// Paths to resume documents
        #[arg(required = true)]
        resumes: Vec<PathBuf>,
        /// Job description text, inline
        #[arg(long, conflicts_with = "job_description_file")]
        job_description: Option<String>,
        /// Read the job description from a file instead
        #[arg(long)]
        job_description_file: Option<PathBuf>,
        /// Drill into one candidate (0-based index into the ranked list)
        #[arg(long)]
        detail: Option<usize>,
    },
    /// Probe the service and print backend / AI readiness
    Status,
    /// Download an analysis report to disk
    Download {
        /// Server-issued report handle from a single analysis
        #[arg(long, conflicts_with = "analysis_id", required_unless_present = "analysis_id")]
        handle: Option<String>,
        /// Per-candidate analysis id from a batch
        #[arg(long)]
        analysis_id: Option<String>,
        /// Where to write the report
        #[arg(long)]
        output: PathBuf,
    },
}

/// One documented source for the job description: inline text wins over the
/// file variant (clap already forbids passing both).
pub fn resolve_job_description(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<String> {
    use anyhow::Context;
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job description from {}", path.display())),
        (None, None) => {
            anyhow::bail!("provide a job description via --job-description or --job-description-file")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_description_wins() {
        let text = resolve_job_description(Some("Rust engineer".to_string()), None).unwrap();
        assert_eq!(text, "Rust engineer");
    }

    #[test]
    fn test_description_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jd.txt");
        std::fs::write(&path, "Senior Rust engineer").unwrap();
        let text = resolve_job_description(None, Some(path)).unwrap();
        assert_eq!(text, "Senior Rust engineer");
    }

    #[test]
    fn test_missing_description_is_an_error() {
        assert!(resolve_job_description(None, None).is_err());
    }

    #[test]
    fn test_cli_parses_batch_with_detail() {
        let cli = Cli::try_parse_from([
            "client",
            "batch",
            "a.pdf",
            "b.pdf",
            "--job-description",
            "JD",
            "--detail",
            "1",
        ])
        .unwrap();
        match cli.command {
            Command::Batch {
                resumes, detail, ..
            } => {
                assert_eq!(resumes.len(), 2);
                assert_eq!(detail, Some(1));
            }
            _ => panic!("expected batch command"),
        }
    }
}
