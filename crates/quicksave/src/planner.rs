//! Track planning: find the media file of a job directory and decide which
//! subtitles go into the container, in which order, with which metadata.

use std::path::{Path, PathBuf};

use crate::Result;
use crate::fs::{file_name_str, list_files};
use crate::muxer::CONTAINER_EXTENSION;
use crate::retrieval::MediaAsset;
use crate::sink::{LogLevel, LogSink};
use crate::subtitles::SUBTITLE_EXTENSION;

/// Subtitle languages the planner knows, in track order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleLanguage {
    English,
    Arabic,
    Russian,
}

impl SubtitleLanguage {
    pub const ALL: [SubtitleLanguage; 3] = [Self::English, Self::Arabic, Self::Russian];

    /// Code used in subtitle file names (`Title.<code>.vtt`).
    pub fn file_code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Arabic => "ar",
            Self::Russian => "ru",
        }
    }

    /// ISO 639-2 code written to the container.
    pub fn iso_code(self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Arabic => "ara",
            Self::Russian => "rus",
        }
    }

    /// Track name, in the language's own script.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Arabic => "العربية",
            Self::Russian => "Русский",
        }
    }

    /// Only English is marked as the default subtitle track.
    pub fn is_default(self) -> bool {
        matches!(self, Self::English)
    }

    fn matches(self, file_name: &str) -> bool {
        file_name.ends_with(&format!(".{}.{}", self.file_code(), SUBTITLE_EXTENSION))
    }
}

/// Metadata for one subtitle track of the output container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    pub name: String,
    pub language: String,
    pub default_track: bool,
    pub path: PathBuf,
}

impl TrackSpec {
    fn for_language(language: SubtitleLanguage, path: PathBuf) -> Self {
        Self {
            name: language.display_name().to_string(),
            language: language.iso_code().to_string(),
            default_track: language.is_default(),
            path,
        }
    }
}

/// Everything the muxer needs for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPlan {
    pub media: MediaAsset,
    /// Subtitle tracks in container order.
    pub tracks: Vec<TrackSpec>,
    pub output: PathBuf,
}

impl TrackPlan {
    /// Every input file, media first.
    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.media.path.as_path()).chain(self.tracks.iter().map(|t| t.path.as_path()))
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|m| m.eq_ignore_ascii_case(ext)))
}

/// Build the ordered track list from the subtitle files of a directory.
///
/// One track per known language, English first. Files with any other suffix
/// are left out.
pub fn build_tracks(subtitles: &[PathBuf]) -> Vec<TrackSpec> {
    SubtitleLanguage::ALL
        .iter()
        .filter_map(|&language| {
            subtitles
                .iter()
                .find(|p| file_name_str(p).is_some_and(|n| language.matches(n)))
                .map(|p| TrackSpec::for_language(language, p.clone()))
        })
        .collect()
}

/// Plan the merge for one job directory (not recursive).
///
/// Returns `Ok(None)` when the directory holds no media file. With several
/// media files, the first by file name is used and the rest are reported.
pub async fn plan(
    dir: &Path,
    media_extensions: &[String],
    sink: &dyn LogSink,
) -> Result<Option<TrackPlan>> {
    let files = list_files(dir).await?;

    let mut media_files = files.iter().filter(|p| has_extension(p, media_extensions));
    let Some(media_path) = media_files.next() else {
        sink.record(
            LogLevel::Info,
            &format!("No media files found in directory {}.", dir.display()),
        );
        return Ok(None);
    };
    let ignored: Vec<String> = media_files.map(|p| p.display().to_string()).collect();
    if !ignored.is_empty() {
        sink.record(
            LogLevel::Warn,
            &format!(
                "Several media files in {}; using {} and ignoring {}",
                dir.display(),
                media_path.display(),
                ignored.join(", ")
            ),
        );
    }

    let subtitles: Vec<PathBuf> = files
        .iter()
        .filter(|p| has_extension(p, &[SUBTITLE_EXTENSION.to_string()]))
        .cloned()
        .collect();
    let tracks = build_tracks(&subtitles);

    let media = MediaAsset::from_path(media_path.clone());
    let output = media.path.with_extension(CONTAINER_EXTENSION);

    sink.record(
        LogLevel::Debug,
        &format!(
            "Planned {} with {} subtitle track(s) -> {}",
            media.path.display(),
            tracks.len(),
            output.display()
        ),
    );

    Ok(Some(TrackPlan {
        media,
        tracks,
        output,
    }))
}
