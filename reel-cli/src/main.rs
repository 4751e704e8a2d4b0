//! recruit-reel CLI: run a pipeline in-process, drive a running daemon, or check credentials.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reel_core::{providers, JobId, JobStatus, JobStore, Orchestrator, ReelConfig, StatusRecord, VideoRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "reel-cli", version, about = "Generate recruitment videos from a job description")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the whole pipeline in this process and print the final video URL.
    Run {
        #[command(flatten)]
        job: JobArgs,
        /// TOML config file (credentials may also come from the environment).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Submit a job to a running daemon and print its id.
    Submit {
        #[arg(long)]
        server: String,
        #[command(flatten)]
        job: JobArgs,
        /// Poll until the job finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Print the status record of a job held by a running daemon.
    Status {
        #[arg(long)]
        server: String,
        job_id: String,
    },
    /// Report which provider credentials are configured.
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct JobArgs {
    /// Job description text.
    #[arg(long, required_unless_present = "description_file", conflicts_with = "description_file")]
    description: Option<String>,
    /// Read the job description from a file.
    #[arg(long)]
    description_file: Option<PathBuf>,
    /// Company logo URL.
    #[arg(long)]
    logo: String,
    /// Hiring manager photo URL.
    #[arg(long)]
    photo: String,
    /// Existing office footage; skips background generation.
    #[arg(long)]
    office_video: Option<String>,
}

impl JobArgs {
    fn into_request(self) -> Result<VideoRequest> {
        let job_description = match (self.description, self.description_file) {
            (Some(d), _) => d,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("read description {}", path.display()))?,
            (None, None) => bail!("a job description is required"),
        };
        if job_description.trim().is_empty() {
            bail!("job description is empty");
        }
        Ok(VideoRequest {
            job_description,
            company_logo_url: self.logo,
            office_video_url: self.office_video,
            manager_photo_url: self.photo,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match Cli::parse().command {
        Command::Run { job, config } => run_local(job.into_request()?, config.as_deref()).await,
        Command::Submit { server, job, wait } => submit(&server, job.into_request()?, wait).await,
        Command::Status { server, job_id } => {
            let record = fetch_status(&reqwest::Client::new(), &server, &job_id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Command::Check { config } => check(config.as_deref()),
    }
}

async fn run_local(request: VideoRequest, config_path: Option<&Path>) -> Result<()> {
    let config = ReelConfig::load(config_path)?;
    let clients = providers::stage_clients(&config)?;
    let store = Arc::new(JobStore::unbounded());
    let orchestrator = Orchestrator::new(Arc::clone(&store), clients);

    let handle = orchestrator.submit(request);
    let watcher = tokio::spawn(watch_local(Arc::clone(&store), handle.id()));
    let result = handle.wait().await;
    watcher.await?;

    match result {
        Ok(video_url) => {
            println!("{video_url}");
            Ok(())
        }
        Err(e) => bail!("video generation failed: {e}"),
    }
}

/// Echo each new status message until the job is terminal.
async fn watch_local(store: Arc<JobStore>, id: JobId) {
    let mut last = String::new();
    loop {
        let record = store.get(&id);
        if record.message != last {
            eprintln!("[{}] {}", record.status.as_str(), record.message);
            last = record.message.clone();
        }
        if record.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

#[derive(serde::Deserialize)]
struct SubmitResponse {
    job_id: String,
}

async fn submit(server: &str, request: VideoRequest, wait: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/generate-recruitment-video", server.trim_end_matches('/'));
    let response = client.post(&url).json(&request).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("submit failed ({status}): {body}");
    }
    let submitted: SubmitResponse = response.json().await?;
    println!("{}", submitted.job_id);
    if !wait {
        return Ok(());
    }

    let mut last = String::new();
    loop {
        let record = fetch_status(&client, server, &submitted.job_id).await?;
        if record.message != last {
            eprintln!("[{}] {}", record.status.as_str(), record.message);
            last = record.message.clone();
        }
        match record.status {
            JobStatus::Processing => tokio::time::sleep(Duration::from_secs(2)).await,
            JobStatus::Completed => {
                println!("{}", record.video_url.unwrap_or_default());
                return Ok(());
            }
            JobStatus::Failed => bail!("video generation failed: {}", record.message),
            JobStatus::NotFound => bail!("job {} not found on {server}", submitted.job_id),
        }
    }
}

async fn fetch_status(client: &reqwest::Client, server: &str, job_id: &str) -> Result<StatusRecord> {
    let url = format!("{}/video-status/{}", server.trim_end_matches('/'), job_id);
    let response = client.get(&url).send().await?.error_for_status()?;
    Ok(response.json().await?)
}

fn check(config_path: Option<&Path>) -> Result<()> {
    let config = ReelConfig::load(config_path)?;
    let mut missing = Vec::new();
    for (provider, variable, set) in config.credential_report() {
        println!("{provider:<12} {variable:<16} {}", if set { "set" } else { "missing" });
        if !set {
            missing.push(variable);
        }
    }
    if !missing.is_empty() {
        bail!("missing credentials: {}", missing.join(", "));
    }
    Ok(())
}
