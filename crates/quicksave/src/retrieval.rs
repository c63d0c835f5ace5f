//! Retrieval adapter: download a video and its subtitles with `yt-dlp`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use process_utils::{run_captured, tokio_command};
use tracing::debug;

use crate::fs::{file_name_str, list_files};
use crate::subtitles::{DUAL_MARKERS, SUBTITLE_EXTENSION};
use crate::{Error, Result};

/// Container the separate video and audio streams are merged into.
pub const MERGE_OUTPUT_FORMAT: &str = "webm";

/// One download request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    /// Root directory; the video lands in `<destination_dir>/<title>/`.
    pub destination_dir: PathBuf,
    pub subtitle_languages: Vec<String>,
}

/// The downloaded media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub path: PathBuf,
    /// Container format, taken from the file extension.
    pub format: String,
}

impl MediaAsset {
    pub fn from_path(path: PathBuf) -> Self {
        let format = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        Self { path, format }
    }

    /// Directory holding the media and its subtitles.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// A downloaded subtitle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleAsset {
    pub path: PathBuf,
    /// Code from the file name, e.g. `en` or `ar-en`.
    pub language: String,
    /// Machine translation of the English transcript (`ar-en`, `ru-en`).
    pub dual_language: bool,
}

impl SubtitleAsset {
    pub fn from_path(path: PathBuf) -> Self {
        let language = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| stem.rsplit_once('.'))
            .map(|(_, code)| code.to_string())
            .unwrap_or_default();
        let dual_language = DUAL_MARKERS.iter().any(|(dual, _)| *dual == language);
        Self {
            path,
            language,
            dual_language,
        }
    }
}

/// Files produced by a successful retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub media: MediaAsset,
    pub subtitles: Vec<SubtitleAsset>,
}

impl FetchedMedia {
    /// Collect the subtitles sitting next to `media` that share its stem.
    pub async fn discover(media: MediaAsset) -> Result<Self> {
        let prefix = media
            .path
            .file_stem()
            .map(|s| format!("{}.", s.to_string_lossy()))
            .unwrap_or_default();
        let subtitles = list_files(media.directory())
            .await?
            .into_iter()
            .filter(|p| {
                file_name_str(p).is_some_and(|n| {
                    n.starts_with(&prefix) && n.ends_with(&format!(".{SUBTITLE_EXTENSION}"))
                })
            })
            .map(SubtitleAsset::from_path)
            .collect();
        Ok(Self { media, subtitles })
    }

    /// Directory the retrieval tool created for this video.
    pub fn directory(&self) -> &Path {
        self.media.directory()
    }
}

/// Produces the media and subtitle files for a job.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(&self, job: &DownloadJob) -> Result<FetchedMedia>;
}

/// [`Retriever`] backed by the `yt-dlp` command line tool.
#[derive(Debug, Clone)]
pub struct YtDlpRetriever {
    binary_path: PathBuf,
    max_height: u32,
}

impl YtDlpRetriever {
    pub fn new(binary_path: impl Into<PathBuf>, max_height: u32) -> Self {
        Self {
            binary_path: binary_path.into(),
            max_height,
        }
    }

    /// Best video and audio up to the height ceiling, falling back to the best
    /// single stream with both.
    pub fn format_selector(&self) -> String {
        format!(
            "(bestvideo[height<={h}]+bestaudio)/best[height<={h}]",
            h = self.max_height
        )
    }

    /// `<destination>/<title>/<title>.<ext>`
    pub fn output_template(destination_dir: &Path) -> String {
        destination_dir
            .join("%(title)s")
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string()
    }

    pub fn build_args(&self, job: &DownloadJob) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            self.format_selector(),
            "--merge-output-format".to_string(),
            MERGE_OUTPUT_FORMAT.to_string(),
        ];

        // Author-provided and automatic captions.
        args.extend([
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            job.subtitle_languages.join(","),
        ]);

        args.extend([
            "--embed-metadata".to_string(),
            "--embed-chapters".to_string(),
            "--output".to_string(),
            Self::output_template(&job.destination_dir),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
        ]);

        // Report where the merged file ended up.
        args.extend([
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ]);

        args.push("--".to_string());
        args.push(job.url.clone());
        args
    }
}

impl Default for YtDlpRetriever {
    fn default() -> Self {
        Self::new("yt-dlp", crate::config::DEFAULT_MAX_HEIGHT)
    }
}

/// Last non-empty stdout line, which `--print after_move:filepath` fills in.
fn reported_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map(PathBuf::from)
}

#[async_trait]
impl Retriever for YtDlpRetriever {
    async fn fetch(&self, job: &DownloadJob) -> Result<FetchedMedia> {
        let args = self.build_args(job);
        debug!("yt-dlp args: {:?}", args);

        let mut cmd = tokio_command(&self.binary_path);
        cmd.args(&args);

        let output = run_captured(&mut cmd).await.map_err(|e| {
            Error::retrieval(
                &job.url,
                format!("failed to start {}: {}", self.binary_path.display(), e),
            )
        })?;

        if !output.success() {
            return Err(Error::retrieval(&job.url, output.failure_reason()));
        }

        let media_path = reported_path(&output.stdout)
            .ok_or_else(|| Error::retrieval(&job.url, "no media file was reported"))?;
        let media_exists = tokio::fs::try_exists(&media_path).await.unwrap_or(false);
        if !media_exists {
            return Err(Error::retrieval(
                &job.url,
                format!("reported media file {} does not exist", media_path.display()),
            ));
        }

        debug!(
            "yt-dlp finished in {:.2}s: {}",
            output.duration.as_secs_f64(),
            media_path.display()
        );
        FetchedMedia::discover(MediaAsset::from_path(media_path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn job(destination: &Path) -> DownloadJob {
        DownloadJob {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            destination_dir: destination.to_path_buf(),
            subtitle_languages: crate::config::DEFAULT_SUBTITLE_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_build_args() {
        let retriever = YtDlpRetriever::default();
        let args = retriever.build_args(&job(Path::new("/videos")));

        assert_eq!(
            value_after(&args, "--format"),
            Some("(bestvideo[height<=1080]+bestaudio)/best[height<=1080]")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("webm"));
        assert_eq!(value_after(&args, "--sub-langs"), Some("en,ar,ru,ar-en,ru-en"));
        let template = Path::new("/videos")
            .join("%(title)s")
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string();
        assert_eq!(value_after(&args, "--output"), Some(template.as_str()));
        assert_eq!(value_after(&args, "--print"), Some("after_move:filepath"));
        for flag in [
            "--write-subs",
            "--write-auto-subs",
            "--embed-metadata",
            "--embed-chapters",
            "--quiet",
            "--no-warnings",
        ] {
            assert!(args.iter().any(|a| a == flag), "missing {flag}");
        }
        assert_eq!(
            args.last().map(|s| s.as_str()),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_format_selector_follows_height() {
        let retriever = YtDlpRetriever::new("yt-dlp", 720);
        assert_eq!(
            retriever.format_selector(),
            "(bestvideo[height<=720]+bestaudio)/best[height<=720]"
        );
    }

    #[test]
    fn test_subtitle_asset_from_path() {
        let sub = SubtitleAsset::from_path(PathBuf::from("/d/My.Talk.ar-en.vtt"));
        assert_eq!(sub.language, "ar-en");
        assert!(sub.dual_language);

        let sub = SubtitleAsset::from_path(PathBuf::from("/d/My.Talk.en.vtt"));
        assert_eq!(sub.language, "en");
        assert!(!sub.dual_language);
    }

    #[test]
    fn test_reported_path_takes_last_line() {
        assert_eq!(
            reported_path("\n/a/Talk/Talk.webm\n\n"),
            Some(PathBuf::from("/a/Talk/Talk.webm"))
        );
        assert_eq!(reported_path("  \n"), None);
    }

    #[tokio::test]
    async fn test_discover_collects_sibling_subtitles() {
        let temp_dir = TempDir::new().unwrap();
        let media = temp_dir.path().join("Talk.webm");
        fs::write(&media, "").unwrap();
        fs::write(temp_dir.path().join("Talk.en.vtt"), "").unwrap();
        fs::write(temp_dir.path().join("Talk.ar-en.vtt"), "").unwrap();
        fs::write(temp_dir.path().join("Other.en.vtt"), "").unwrap();

        let fetched = FetchedMedia::discover(MediaAsset::from_path(media))
            .await
            .unwrap();
        assert_eq!(fetched.media.format, "webm");
        let mut languages: Vec<&str> =
            fetched.subtitles.iter().map(|s| s.language.as_str()).collect();
        languages.sort();
        assert_eq!(languages, ["ar-en", "en"]);
        assert_eq!(fetched.directory(), temp_dir.path());
    }

    #[cfg(unix)]
    mod stub_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-yt-dlp");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_fetch_reports_tool_failure() {
            let temp_dir = TempDir::new().unwrap();
            let script = write_script(temp_dir.path(), "echo 'ERROR: Video unavailable' >&2\nexit 1");
            let retriever = YtDlpRetriever::new(script, 1080);

            let err = retriever.fetch(&job(temp_dir.path())).await.unwrap_err();
            match err {
                Error::RetrievalFailure { url, reason } => {
                    assert!(url.contains("dQw4w9WgXcQ"));
                    assert!(reason.contains("Video unavailable"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_fetch_reads_printed_path() {
            let temp_dir = TempDir::new().unwrap();
            let video_dir = temp_dir.path().join("Talk");
            fs::create_dir(&video_dir).unwrap();
            fs::write(video_dir.join("Talk.webm"), "").unwrap();
            fs::write(video_dir.join("Talk.en.vtt"), "").unwrap();
            let script = write_script(
                temp_dir.path(),
                &format!("echo '{}'", video_dir.join("Talk.webm").display()),
            );
            let retriever = YtDlpRetriever::new(script, 1080);

            let fetched = retriever.fetch(&job(temp_dir.path())).await.unwrap();
            assert_eq!(fetched.media.path, video_dir.join("Talk.webm"));
            assert_eq!(fetched.subtitles.len(), 1);
        }

        #[tokio::test]
        async fn test_fetch_without_printed_path_fails() {
            let temp_dir = TempDir::new().unwrap();
            let script = write_script(temp_dir.path(), "exit 0");
            let retriever = YtDlpRetriever::new(script, 1080);

            let err = retriever.fetch(&job(temp_dir.path())).await.unwrap_err();
            assert!(err.to_string().contains("no media file was reported"));
        }
    }
}
