mod cli;
mod config;
mod console;
mod error;
mod input;
mod logging;

use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use quicksave_core::{Pipeline, PipelineConfig};
use tracing::{error, info};

use crate::{
    cli::Args,
    console::ConsoleSink,
    error::{AppError, Result},
    input::Choice,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        // Job failures were already reported with the step output.
        if !matches!(e, AppError::Job(_)) {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let config = config::apply_overrides(config, &args);

    let _guard = logging::init_logging(&config.logs_dir, args.verbose)?;
    info!(
        "Starting quicksave {} (destination: {}, mkvmerge: {}, yt-dlp: {})",
        env!("CARGO_PKG_VERSION"),
        config.destination_dir.display(),
        config.muxer_path.display(),
        config.retriever_path.display()
    );

    let result = run_pipeline(config, args.url.as_deref()).await;
    // Logged while the file writer is still alive.
    if let Err(e) = &result {
        error!("Application error: {}", e);
    }
    result
}

async fn run_pipeline(config: PipelineConfig, url: Option<&str>) -> Result<()> {
    let mut pipeline = Pipeline::new(config, Arc::new(ConsoleSink::new()))?;

    match url {
        Some(url) => run_once(&mut pipeline, url).await,
        None => interactive(&mut pipeline).await,
    }
}

/// Process one URL; a failed job makes the process exit non-zero.
async fn run_once(pipeline: &mut Pipeline, url: &str) -> Result<()> {
    let result = pipeline.run_job(url).await;
    console::print_report(&result);
    result.map(|_| ()).map_err(AppError::from)
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?
        .map_err(AppError::from)
}

/// Prompt for URLs until the user presses Esc or stdin closes.
async fn interactive(pipeline: &mut Pipeline) -> Result<()> {
    loop {
        console::clear_screen();
        console::print_banner();
        console::prompt_url();

        let Some(url) = blocking(input::read_line).await? else {
            println!();
            return Ok(());
        };
        println!();

        let result = pipeline.run_job(&url).await;
        console::print_report(&result);
        match &result {
            Ok(outcome) => {
                if let Some(output) = outcome.output() {
                    info!("Job for {} produced {}", url, output.display());
                }
            }
            Err(e) => info!("Job for {} ended in stage {}", url, e.stage),
        }

        console::prompt_restart();
        match blocking(input::wait_for_choice).await? {
            Choice::Restart => continue,
            Choice::Exit => {
                println!("Exiting...");
                return Ok(());
            }
        }
    }
}
