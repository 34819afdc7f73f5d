use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use vidblur_client::config::ClientConfig;
use vidblur_client::events::JobEvent;
use vidblur_client::models::job::{Job, JobStatus};
use vidblur_client::models::params::BlurParams;
use vidblur_client::models::upload::UploadFile;
use vidblur_client::session::Session;

#[derive(Parser)]
#[command(name = "vidblur", version, about = "Submit and track video redaction jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video for redaction and track it to completion
    Submit {
        /// Path to the video file (mp4 or mov)
        video: PathBuf,

        /// Words to redact regardless of detection confidence (repeatable)
        #[arg(short, long)]
        word: Vec<String>,

        /// Gaussian kernel size (odd number)
        #[arg(long, default_value_t = 51)]
        blur_strength: u32,

        /// Detection confidence threshold (0.0 - 1.0)
        #[arg(long, default_value_t = 0.5)]
        confidence: f64,

        /// Analyze every Nth frame
        #[arg(long, default_value_t = 1)]
        sample_rate: u32,

        /// Extra pixels blurred around each detection
        #[arg(long, default_value_t = 10)]
        padding: u32,

        /// Detector languages (repeatable)
        #[arg(short, long, default_values_t = [String::from("en")])]
        language: Vec<String>,

        /// Submit only; do not poll for completion
        #[arg(long)]
        no_wait: bool,

        /// Where to save the result once completed
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch the current status of a job
    Status { job_id: String },

    /// Poll a job until it reaches a terminal state
    Watch {
        job_id: String,

        /// Download the result after completion
        #[arg(long)]
        download: bool,

        /// Where to save the result
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the result of a completed job
    Download {
        job_id: String,

        /// Where to save the result
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete or cancel a job
    Delete { job_id: String },

    /// Check backend availability
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (session, events) = Session::new(config);

    match run(cli.command, &session, events).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    session: &Session,
    mut events: UnboundedReceiver<JobEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Submit {
            video,
            word,
            blur_strength,
            confidence,
            sample_rate,
            padding,
            language,
            no_wait,
            output,
        } => {
            let params = BlurParams {
                blur_strength,
                confidence,
                sample_rate,
                padding,
                languages: language,
                words: word,
            };

            let file = UploadFile::from_path(&video).await?;
            let job = session.submit(&file, &params).await?;
            println!("Submitted job {} ({})", job.id, job.status);

            if no_wait {
                return Ok(());
            }

            session.start_polling(&job.id);
            let job = watch_until_terminal(&mut events, &job.id).await?;
            if job.status == JobStatus::Completed {
                save(session, &job, output).await?;
            }
        }

        Command::Status { job_id } => {
            let job = session.refresh_job(&job_id).await?;
            print_job(&job);
        }

        Command::Watch {
            job_id,
            download,
            output,
        } => {
            session.refresh_job(&job_id).await?;
            session.start_polling(&job_id);
            let job = watch_until_terminal(&mut events, &job_id).await?;
            if download && job.status == JobStatus::Completed {
                save(session, &job, output).await?;
            }
        }

        Command::Download { job_id, output } => {
            let job = session.refresh_job(&job_id).await?;
            save(session, &job, output).await?;
        }

        Command::Delete { job_id } => {
            session.delete_job(&job_id).await?;
            println!("Deleted job {job_id}");
        }

        Command::Health => {
            let health = session.health().await?;
            match health.version {
                Some(version) => println!("Backend {}: {}", version, health.status),
                None => println!("Backend: {}", health.status),
            }
        }
    }

    Ok(())
}

/// Consume session events until the watched job reaches a terminal state.
async fn watch_until_terminal(
    events: &mut UnboundedReceiver<JobEvent>,
    job_id: &str,
) -> Result<Job, Box<dyn std::error::Error>> {
    while let Some(event) = events.recv().await {
        if event.job_id() != job_id {
            continue;
        }
        match event {
            JobEvent::Upserted(job) if job.status == JobStatus::Processing => {
                println!("Processing: {}%", job.progress);
            }
            JobEvent::Completed(job) => {
                println!("Job {} completed", job.id);
                return Ok(job);
            }
            JobEvent::Failed(job) => {
                let reason = job.error.as_deref().unwrap_or("unknown error").to_string();
                return Err(format!("job {} failed: {reason}", job.id).into());
            }
            JobEvent::PollingLost { error, .. } => {
                return Err(format!("lost track of job {job_id}: {error}").into());
            }
            _ => {}
        }
    }
    Err("event stream closed before the job finished".into())
}

async fn save(
    session: &Session,
    job: &Job,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = output.unwrap_or_else(|| PathBuf::from(Session::suggested_output_name(job)));
    let size = session.save_result(&job.id, &path).await?;
    println!("Saved {} bytes to {}", size, path.display());
    Ok(())
}

fn print_job(job: &Job) {
    println!("Job:      {}", job.id);
    println!("Status:   {}", job.status);
    if job.status == JobStatus::Processing {
        println!("Progress: {}%", job.progress);
    }
    if let Some(input) = &job.input_file {
        println!("Input:    {input}");
    }
    if let Some(output) = &job.output_file {
        println!("Output:   {output}");
    }
    if let Some(created) = &job.created_at {
        println!("Created:  {created}");
    }
    if let Some(completed) = &job.completed_at {
        println!("Finished: {completed}");
    }
    if let Some(params) = &job.parameters {
        println!(
            "Params:   blur={} confidence={} sample_rate={} padding={}px languages={}",
            params.display_blur_strength(),
            params.display_confidence(),
            params.sample_rate,
            params.padding,
            params.languages.join(",")
        );
    }
    if let Some(error) = &job.error {
        println!("Error:    {error}");
    }
}
