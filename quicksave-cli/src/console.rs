//! Terminal presentation: banner, numbered step lines and the job report.

use std::io::{self, Write};

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use parking_lot::Mutex;
use quicksave_core::{
    Error, JobError, JobOutcome, JobStage, LogLevel, LogSink, TracingSink,
};

/// A numbered step shown while a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub number: u8,
    pub running: &'static str,
    pub done: &'static str,
}

impl Step {
    /// The step a stage starts, if any. Planning belongs to the preparation
    /// step that normalizing already opened.
    pub fn for_stage(stage: JobStage) -> Option<Step> {
        let step = match stage {
            JobStage::Fetching => Step {
                number: 1,
                running: "Downloading necessary file(s)",
                done: "File(s) successfully downloaded",
            },
            JobStage::Normalizing => Step {
                number: 2,
                running: "Preparing file(s) to be merged",
                done: "File(s) successfully prepared for merging",
            },
            JobStage::Muxing => Step {
                number: 3,
                running: "Merging file(s)",
                done: "File(s) successfully merged",
            },
            _ => return None,
        };
        Some(step)
    }

    fn label(&self) -> String {
        format!("STEP {}", self.number)
    }
}

/// Status sink for the console: every record goes to the log file through
/// `tracing`, and stage changes drive the step lines.
#[derive(Default)]
pub struct ConsoleSink {
    inner: TracingSink,
    current: Mutex<Option<Step>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace_last_line(line: String) {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        cursor::MoveToPreviousLine(1),
        Clear(ClearType::CurrentLine)
    );
    println!("{line}");
}

impl LogSink for ConsoleSink {
    fn record(&self, level: LogLevel, message: &str) {
        self.inner.record(level, message);
    }

    fn stage_changed(&self, stage: JobStage) {
        self.inner.stage_changed(stage);

        let mut current = self.current.lock();
        if let Some(step) = current.take() {
            if stage == JobStage::Failed {
                replace_last_line(format!("{} {}", step.label().red().bold(), step.running.red()));
            } else {
                replace_last_line(format!("{} {}", step.label().green().bold(), step.done.green()));
            }
        }
        if let Some(step) = Step::for_stage(stage) {
            println!("{} {}", step.label().yellow().bold(), step.running);
            *current = Some(step);
        }
        let _ = io::stdout().flush();
    }
}

pub fn clear_screen() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0));
}

#[allow(clippy::println_empty_string)]
pub fn print_banner() {
    println!("==================================================================");
    println!(" QuickSave - YouTube video + subtitles, remuxed into one MKV");
    println!("==================================================================");
    println!("");
}

pub fn prompt_url() {
    print!("Enter the video URL: ");
    let _ = io::stdout().flush();
}

pub fn prompt_restart() {
    println!();
    println!(
        "Press {} to start again or {} to close...",
        "Enter".bold(),
        "Esc".bold()
    );
}

/// User-facing text for a failed job.
pub fn failure_message(err: &JobError) -> String {
    match &err.source {
        Error::InvalidUrl { .. } => {
            "Invalid YouTube URL. Please enter a valid URL from youtube.com.".to_string()
        }
        Error::RetrievalFailure { .. } => {
            format!("Download failed: {}", err.source)
        }
        Error::MergeFailure { .. } => format!("Merging failed: {}", err.source),
        _ => err.to_string(),
    }
}

/// Print the end of a job: the cleanup step and the output path, or why it
/// failed.
pub fn print_report(result: &Result<JobOutcome, JobError>) {
    match result {
        Ok(JobOutcome::Merged(mux_result)) => {
            if mux_result.is_clean() {
                println!(
                    "{} {}",
                    "STEP 4".green().bold(),
                    "Temp file(s) successfully deleted".green()
                );
            } else {
                println!(
                    "{} {}",
                    "STEP 4".yellow().bold(),
                    format!(
                        "{} temp file(s) could not be deleted, see the log",
                        mux_result.cleanup_failures.len()
                    )
                    .yellow()
                );
            }
            println!();
            println!("Output : {}", mux_result.output.display());
        }
        Ok(JobOutcome::NothingToDo { directory }) => {
            println!();
            println!(
                "{}",
                format!("Nothing to merge in {}", directory.display()).yellow()
            );
        }
        Err(err) => {
            println!();
            println!("{} {}", "Error:".red().bold(), failure_message(err).red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_follow_stages() {
        let numbers: Vec<u8> = [
            JobStage::Idle,
            JobStage::Fetching,
            JobStage::Normalizing,
            JobStage::Planning,
            JobStage::Muxing,
            JobStage::Done,
            JobStage::Failed,
        ]
        .into_iter()
        .filter_map(Step::for_stage)
        .map(|step| step.number)
        .collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn test_failure_message() {
        let invalid = JobError::new(JobStage::Idle, Error::invalid_url("https://vimeo.com/1"));
        assert!(failure_message(&invalid).starts_with("Invalid YouTube URL"));

        let fetch = JobError::new(
            JobStage::Fetching,
            Error::retrieval("https://youtu.be/dQw4w9WgXcQ", "exit code 1: HTTP Error 403"),
        );
        let message = failure_message(&fetch);
        assert!(message.starts_with("Download failed"));
        assert!(message.contains("403"));
    }
}
