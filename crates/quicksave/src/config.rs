//! Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Subtitle languages requested from the retrieval tool. `ar-en` and `ru-en`
/// are machine translations of the English transcript.
pub const DEFAULT_SUBTITLE_LANGUAGES: &[&str] = &["en", "ar", "ru", "ar-en", "ru-en"];

/// Resolution ceiling for the downloaded video.
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

#[cfg(windows)]
const DEFAULT_MUXER_PATH: &str = r"C:\Program Files\MKVToolNix\mkvmerge.exe";
#[cfg(not(windows))]
const DEFAULT_MUXER_PATH: &str = "mkvmerge";

fn default_destination_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("Logs")
}

fn default_muxer_path() -> PathBuf {
    PathBuf::from(DEFAULT_MUXER_PATH)
}

fn default_retriever_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_subtitle_languages() -> Vec<String> {
    DEFAULT_SUBTITLE_LANGUAGES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

fn default_media_extensions() -> Vec<String> {
    vec!["webm".to_string(), "mp4".to_string()]
}

/// Everything a [`Pipeline`](crate::Pipeline) needs to run jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root under which each video gets its own `<title>/` directory.
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Directory for the daily log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// `mkvmerge` executable.
    #[serde(default = "default_muxer_path")]
    pub muxer_path: PathBuf,

    /// `yt-dlp` executable.
    #[serde(default = "default_retriever_path")]
    pub retriever_path: PathBuf,

    #[serde(default = "default_subtitle_languages")]
    pub subtitle_languages: Vec<String>,

    /// Maximum video height in pixels.
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Extensions (without dot) the planner treats as the media file.
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destination_dir: default_destination_dir(),
            logs_dir: default_logs_dir(),
            muxer_path: default_muxer_path(),
            retriever_path: default_retriever_path(),
            subtitle_languages: default_subtitle_languages(),
            max_height: default_max_height(),
            media_extensions: default_media_extensions(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.subtitle_languages.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::config("subtitle_languages must not be empty"));
        }
        if self.max_height == 0 {
            return Err(Error::config("max_height must be greater than zero"));
        }
        if self.media_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::config("media_extensions must not be empty"));
        }
        if self
            .media_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(crate::muxer::CONTAINER_EXTENSION))
        {
            return Err(Error::config(
                "media_extensions must not contain the output container extension",
            ));
        }
        Ok(())
    }
}
