//! Muxer adapter: merge the media file and the planned subtitle tracks with
//! `mkvmerge`, then remove the inputs.
//!
//! Inputs are only removed after `mkvmerge` exited with status 0. A failed
//! merge leaves every input in place for inspection or a retry.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use process_utils::{run_captured, tokio_command};
use tracing::debug;

use crate::planner::{TrackPlan, TrackSpec};
use crate::sink::{LogLevel, LogSink};
use crate::{Error, Result};

/// Extension of the output container.
pub const CONTAINER_EXTENSION: &str = "mkv";

/// A finished merge.
#[derive(Debug)]
pub struct MuxResult {
    pub output: PathBuf,
    /// Inputs that could not be removed. The merge itself still succeeded.
    pub cleanup_failures: Vec<Error>,
}

impl MuxResult {
    pub fn is_clean(&self) -> bool {
        self.cleanup_failures.is_empty()
    }
}

/// Append `.mkv` unless `path` already ends with it (case-insensitive).
pub fn ensure_container_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CONTAINER_EXTENSION));
    if has_extension {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(CONTAINER_EXTENSION);
    PathBuf::from(name)
}

fn track_args(track: &TrackSpec) -> [String; 7] {
    [
        "--track-name".to_string(),
        format!("0:{}", track.name),
        "--language".to_string(),
        format!("0:{}", track.language),
        "--default-track".to_string(),
        format!("0:{}", if track.default_track { "yes" } else { "no" }),
        track.path.to_string_lossy().to_string(),
    ]
}

/// `-o <output> <media> [<track options> <subtitle>]...`
pub fn build_args(plan: &TrackPlan, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        output.to_string_lossy().to_string(),
        plan.media.path.to_string_lossy().to_string(),
    ];
    for track in &plan.tracks {
        args.extend(track_args(track));
    }
    args
}

/// Remove the media file, then every planned subtitle. Keeps going after a
/// failed removal and returns the failures.
async fn remove_inputs(plan: &TrackPlan, sink: &dyn LogSink) -> Vec<Error> {
    let mut failures = Vec::new();

    for path in plan.inputs() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                sink.record(LogLevel::Info, &format!("Deleted input file {}", path.display()));
            }
            Err(e) => {
                sink.record(
                    LogLevel::Error,
                    &format!("Cleanup failed for {}: {}", path.display(), e),
                );
                failures.push(Error::CleanupFailure {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    failures
}

/// Merge `plan` into one container with the `mkvmerge` at `muxer_path`.
///
/// `mkvmerge`'s own output is captured, never shown; its stderr tail ends up
/// in the [`Error::MergeFailure`] reason.
pub async fn mux(plan: &TrackPlan, muxer_path: &Path, sink: &dyn LogSink) -> Result<MuxResult> {
    let output = ensure_container_extension(&plan.output);
    let args = build_args(plan, &output);
    debug!("mkvmerge args: {:?}", args);

    let mut cmd = tokio_command(muxer_path);
    cmd.args(&args);

    let command_output = match run_captured(&mut cmd).await {
        Ok(command_output) => command_output,
        Err(e) => {
            let reason = format!("failed to start {}: {}", muxer_path.display(), e);
            sink.record(LogLevel::Error, &format!("Error occurred: {reason}"));
            return Err(Error::MergeFailure {
                output,
                exit_code: None,
                reason,
            });
        }
    };

    if !command_output.success() {
        let reason = command_output.failure_reason();
        sink.record(
            LogLevel::Error,
            &format!(
                "Error occurred while merging {} into {}: {}",
                plan.media.path.display(),
                output.display(),
                reason
            ),
        );
        return Err(Error::MergeFailure {
            output,
            exit_code: command_output.code(),
            reason,
        });
    }

    sink.record(
        LogLevel::Info,
        &format!(
            "Merged files into {} successfully in {:.2}s!",
            output.display(),
            command_output.duration.as_secs_f64()
        ),
    );

    let cleanup_failures = remove_inputs(plan, sink).await;
    if cleanup_failures.is_empty() {
        sink.record(LogLevel::Info, "Input files deleted.");
    }

    Ok(MuxResult {
        output,
        cleanup_failures,
    })
}
