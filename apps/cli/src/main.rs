use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use vidbrief_core::{
    CredentialProvider, FfmpegMedia, FsArtifactStore, FsCredentialStore, OpenAiIntelligence,
    Pipeline, PipelineResult, VideoId,
};

#[derive(Parser)]
#[command(name = "vidbrief")]
#[command(
    about = "Summarize a downloaded video: transcribe its audio, analyze sampled frames, and consolidate both into one report"
)]
struct Cli {
    /// Artifact store root (defaults to the platform cache directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the summarization pipeline for a video
    Run {
        /// Video URL or bare identifier
        video: String,

        /// Print the result as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Report which artifacts are cached for a video, without doing any work
    Status {
        /// Video URL or bare identifier
        video: String,

        #[arg(long)]
        json: bool,
    },
    /// Copy a local video file into the store as a video's source
    Import {
        /// Video URL or bare identifier
        video: String,

        /// Path to the video file
        file: PathBuf,
    },
    /// Manage the API credential record
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key
    Set { api_key: String },
    /// Remove the stored API key
    Clear,
    /// Show whether an API key is configured
    Status,
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn stage_line(name: &str, cached: bool) -> String {
    if cached {
        format!(
            "{} {} {}",
            style("✓").green().bold(),
            name,
            style("(cached)").dim()
        )
    } else {
        format!("{} {}", style("✓").green().bold(), name)
    }
}

fn print_result(result: &PipelineResult) {
    println!("{}", stage_line("Audio extracted", result.cache.audio));
    println!("{}", stage_line("Transcribed", result.cache.transcript));
    println!(
        "{} {}",
        stage_line("Frames sampled", result.cache.frames),
        style(format!("[{} frames]", result.frame_count)).dim()
    );

    println!("\n{}", style("─".repeat(60)).dim());
    println!("\n{}\n", style("Visual content").cyan().bold());
    println!("{}", result.visual_summary);
    println!("\n{}\n", style("Spoken content").cyan().bold());
    println!("{}", result.audio_summary);
    println!("\n{}\n", style("Overview").cyan().bold());
    println!("{}", result.final_summary);
}

fn build_pipeline(store_root: Option<PathBuf>) -> Pipeline {
    let store = Arc::new(FsArtifactStore::new(
        store_root.unwrap_or_else(FsArtifactStore::default_root),
    ));
    let credentials = Arc::new(FsCredentialStore::new(FsCredentialStore::default_path()));
    let media = Arc::new(FfmpegMedia::new());
    Pipeline::new(
        store,
        credentials,
        media.clone(),
        media,
        Arc::new(OpenAiIntelligence::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { video, json } => {
            let id = VideoId::parse(&video)?;
            let pipeline = build_pipeline(cli.store);

            let start = Instant::now();
            let spinner = (!json).then(|| create_spinner(&format!("Summarizing {id}...")));
            let result = pipeline.run(&id).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            let result = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "\n{}  {}\n",
                    style("vidbrief").cyan().bold(),
                    style(id.as_str()).dim()
                );
                print_result(&result);
                println!(
                    "\n{} {}",
                    style("Total time:").dim(),
                    style(format_duration(start.elapsed())).cyan().bold()
                );
            }
        }
        Commands::Status { video, json } => {
            let id = VideoId::parse(&video)?;
            let pipeline = build_pipeline(cli.store);
            let status = pipeline.status(&id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                let mark = |present: bool| {
                    if present {
                        style("✓").green().bold()
                    } else {
                        style("✗").red()
                    }
                };
                let entries = [
                    ("Source video", status.video_exists, &status.video_path),
                    ("Audio", status.audio_path.is_some(), &status.audio_path),
                    (
                        "Transcript",
                        status.transcript_path.is_some(),
                        &status.transcript_path,
                    ),
                    ("Frames", status.frames_path.is_some(), &status.frames_path),
                ];
                for (name, present, path) in entries {
                    println!("{} {}", mark(present), name);
                    if let Some(path) = path {
                        println!("    {}", style(path.display()).dim());
                    }
                }
            }
        }
        Commands::Import { video, file } => {
            let id = VideoId::parse(&video)?;
            let store =
                FsArtifactStore::new(cli.store.unwrap_or_else(FsArtifactStore::default_root));
            let dest = store.import_video(&id, &file).await?;
            println!(
                "{} Imported {} {}",
                style("✓").green().bold(),
                id,
                style(dest.display()).dim()
            );
        }
        Commands::Key { action } => {
            let credentials = FsCredentialStore::new(FsCredentialStore::default_path());
            match action {
                KeyAction::Set { api_key } => {
                    credentials.set(&api_key).await?;
                    println!("{} API key stored", style("✓").green().bold());
                }
                KeyAction::Clear => {
                    credentials.clear().await?;
                    println!("{} API key cleared", style("✓").green().bold());
                }
                KeyAction::Status => {
                    if credentials.get().await?.is_some() {
                        println!("{} API key configured", style("✓").green().bold());
                    } else {
                        println!("{} No API key configured", style("✗").red());
                    }
                }
            }
        }
    }

    Ok(())
}
