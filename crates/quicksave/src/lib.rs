//! Core of QuickSave: fetch a video with its subtitles and pack everything
//! into a single Matroska file.
//!
//! A job runs through four stateless services, sequenced by [`Pipeline`]:
//!
//! 1. [`retrieval`]: download the media and subtitle files with `yt-dlp`.
//! 2. [`subtitles`]: rename dual-language subtitles (`.ar-en.vtt`) to their
//!    single-language form.
//! 3. [`planner`]: pick the media file and order the subtitle tracks.
//! 4. [`muxer`]: run `mkvmerge` and remove the inputs once it succeeded.

pub mod config;
pub mod error;
pub mod fs;
pub mod muxer;
pub mod pipeline;
pub mod planner;
pub mod retrieval;
pub mod sink;
pub mod subtitles;
pub mod url;

pub use config::PipelineConfig;
pub use error::{Error, JobError, Result};
pub use muxer::{MuxResult, ensure_container_extension, mux};
pub use pipeline::{JobOutcome, JobStage, Pipeline};
pub use planner::{TrackPlan, TrackSpec, plan};
pub use retrieval::{DownloadJob, FetchedMedia, Retriever, YtDlpRetriever};
pub use sink::{LogLevel, LogSink, MemorySink, TracingSink};
pub use subtitles::{NormalizeReport, normalize};
pub use url::is_video_url;
