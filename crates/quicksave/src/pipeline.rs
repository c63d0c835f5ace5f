//! Job orchestration.
//!
//! A job moves `Idle → Fetching → Normalizing → Planning → Muxing → Done`.
//! Any stage can end in `Failed`, after which nothing else runs for that job.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::JobError;
use crate::fs::ensure_dir_all;
use crate::muxer::{MuxResult, mux};
use crate::planner::plan;
use crate::retrieval::{DownloadJob, Retriever, SubtitleAsset, YtDlpRetriever};
use crate::sink::{LogLevel, LogSink};
use crate::subtitles::normalize;
use crate::url::video_id;
use crate::{Error, Result};

/// Where a job is in its lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStage {
    Idle,
    Fetching,
    Normalizing,
    Planning,
    Muxing,
    Done,
    Failed,
}

/// How a successful job ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// Media and subtitles were merged.
    Merged(MuxResult),
    /// The job directory held no media file; nothing was merged.
    NothingToDo { directory: PathBuf },
}

impl JobOutcome {
    pub fn output(&self) -> Option<&std::path::Path> {
        match self {
            Self::Merged(result) => Some(&result.output),
            Self::NothingToDo { .. } => None,
        }
    }
}

/// `Downloaded 2 subtitle(s): en, ar-en (1 machine-translated)`
fn subtitle_summary(subtitles: &[SubtitleAsset]) -> String {
    if subtitles.is_empty() {
        return "Downloaded no subtitles".to_string();
    }
    let languages: Vec<&str> = subtitles.iter().map(|s| s.language.as_str()).collect();
    let translated = subtitles.iter().filter(|s| s.dual_language).count();
    let mut summary = format!(
        "Downloaded {} subtitle(s): {}",
        subtitles.len(),
        languages.join(", ")
    );
    if translated > 0 {
        summary.push_str(&format!(" ({translated} machine-translated)"));
    }
    summary
}

/// Runs download-then-remux jobs, one at a time.
pub struct Pipeline {
    config: PipelineConfig,
    retriever: Box<dyn Retriever>,
    sink: Arc<dyn LogSink>,
    stage: JobStage,
}

impl Pipeline {
    /// Create a pipeline that downloads with `yt-dlp`.
    pub fn new(config: PipelineConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        let retriever = YtDlpRetriever::new(&config.retriever_path, config.max_height);
        Self::with_retriever(config, Box::new(retriever), sink)
    }

    /// Create a pipeline with a custom retrieval backend.
    pub fn with_retriever(
        config: PipelineConfig,
        retriever: Box<dyn Retriever>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            retriever,
            sink,
            stage: JobStage::Idle,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage of the current or last job.
    pub fn stage(&self) -> JobStage {
        self.stage
    }

    fn enter(&mut self, stage: JobStage) {
        self.stage = stage;
        self.sink.stage_changed(stage);
    }

    fn fail(&mut self, stage: JobStage, url: &str, source: Error) -> JobError {
        self.sink
            .record(LogLevel::Error, &format!("Error {stage} {url}: {source}"));
        self.enter(JobStage::Failed);
        JobError::new(stage, source)
    }

    /// Run one job to completion.
    ///
    /// The URL is checked before any I/O; a rejected URL fails in the `Idle`
    /// stage. Taking `&mut self` keeps jobs from overlapping.
    pub async fn run_job(&mut self, url: &str) -> std::result::Result<JobOutcome, JobError> {
        self.stage = JobStage::Idle;

        let Some(id) = video_id(url) else {
            self.sink
                .record(LogLevel::Error, &format!("Invalid video URL: {url}"));
            return Err(JobError::new(JobStage::Idle, Error::invalid_url(url)));
        };
        self.sink
            .record(LogLevel::Debug, &format!("Starting job for video {id}"));

        let job = DownloadJob {
            url: url.to_string(),
            destination_dir: self.config.destination_dir.clone(),
            subtitle_languages: self.config.subtitle_languages.clone(),
        };

        self.enter(JobStage::Fetching);
        if let Err(e) = ensure_dir_all(&job.destination_dir).await {
            return Err(self.fail(JobStage::Fetching, url, e));
        }
        let fetch_result = self.retriever.fetch(&job).await;
        let fetched = match fetch_result {
            Ok(fetched) => fetched,
            Err(e) => return Err(self.fail(JobStage::Fetching, url, e)),
        };
        self.sink
            .record(LogLevel::Info, &format!("Downloaded video from {url}"));
        self.sink
            .record(LogLevel::Info, &subtitle_summary(&fetched.subtitles));
        let directory = fetched.directory().to_path_buf();

        self.enter(JobStage::Normalizing);
        if let Err(e) = normalize(&directory, self.sink.as_ref()).await {
            return Err(self.fail(JobStage::Normalizing, url, e));
        }

        self.enter(JobStage::Planning);
        let plan_result = plan(
            &directory,
            &self.config.media_extensions,
            self.sink.as_ref(),
        )
        .await;
        let planned = match plan_result {
            Ok(planned) => planned,
            Err(e) => return Err(self.fail(JobStage::Planning, url, e)),
        };
        let Some(track_plan) = planned else {
            self.enter(JobStage::Done);
            return Ok(JobOutcome::NothingToDo { directory });
        };

        self.enter(JobStage::Muxing);
        let mux_result = mux(&track_plan, &self.config.muxer_path, self.sink.as_ref()).await;
        let result = match mux_result {
            Ok(result) => result,
            Err(e) => return Err(self.fail(JobStage::Muxing, url, e)),
        };

        self.enter(JobStage::Done);
        Ok(JobOutcome::Merged(result))
    }
}
