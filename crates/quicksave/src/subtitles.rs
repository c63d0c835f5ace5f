//! Subtitle normalization.
//!
//! The retrieval tool names machine-translated subtitles with a dual marker
//! (`Title.ar-en.vtt`: Arabic translated from the English transcript). The
//! planner only knows single-language suffixes, so those files are renamed in
//! place to `Title.ar.vtt` before planning.

use std::path::{Path, PathBuf};

use crate::fs::{file_name_str, io_error, walk_files};
use crate::sink::{LogLevel, LogSink};
use crate::Result;

/// Subtitle file extension produced by the retrieval tool.
pub const SUBTITLE_EXTENSION: &str = "vtt";

/// Dual-language markers and the single-language code that replaces them.
pub const DUAL_MARKERS: &[(&str, &str)] = &[("ar-en", "ar"), ("ru-en", "ru")];

/// What a normalization pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `(old, new)` path pairs.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Dual-marker files left alone because the single-language file exists.
    pub skipped: Vec<PathBuf>,
}

/// Single-language file name for a dual-marker subtitle name, or `None` when
/// the name carries no dual marker.
pub fn normalized_name(file_name: &str) -> Option<String> {
    DUAL_MARKERS.iter().find_map(|(dual, single)| {
        let suffix = format!(".{dual}.{SUBTITLE_EXTENSION}");
        file_name
            .strip_suffix(&suffix)
            .map(|stem| format!("{stem}.{single}.{SUBTITLE_EXTENSION}"))
    })
}

/// Rename every dual-marker subtitle below `dir` to its single-language name.
///
/// Idempotent: renamed files no longer carry a dual marker. When the target
/// name is already taken the existing file is kept and the dual file is left
/// untouched.
pub async fn normalize(dir: &Path, sink: &dyn LogSink) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();

    for path in walk_files(dir).await? {
        let Some(new_name) = file_name_str(&path).and_then(normalized_name) else {
            continue;
        };
        let target = path.with_file_name(&new_name);

        let target_exists = tokio::fs::try_exists(&target)
            .await
            .map_err(|e| io_error("checking", &target, e))?;
        if target_exists {
            sink.record(
                LogLevel::Info,
                &format!(
                    "Keeping existing {}, not renaming {}",
                    target.display(),
                    path.display()
                ),
            );
            report.skipped.push(path);
            continue;
        }

        tokio::fs::rename(&path, &target)
            .await
            .map_err(|e| io_error("renaming", &path, e))?;
        sink.record(
            LogLevel::Info,
            &format!(
                "Renamed {} to {}",
                file_name_str(&path).unwrap_or_default(),
                new_name
            ),
        );
        report.renamed.push((path, target));
    }

    Ok(report)
}
