use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "quicksave",
    version,
    about = "Download a YouTube video with its subtitles and remux them into one MKV",
    long_about = None
)]
pub struct Args {
    /// Process a single URL and exit instead of prompting for URLs
    #[arg(short, long)]
    pub url: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Path to the mkvmerge executable
    #[arg(long, env = "QUICKSAVE_MKVMERGE", value_name = "PATH")]
    pub muxer: Option<PathBuf>,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", env = "QUICKSAVE_YTDLP", value_name = "PATH")]
    pub retriever: Option<PathBuf>,

    /// Directory for the daily log files
    #[arg(long, value_name = "DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also print log output to the terminal
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "quicksave",
            "--url",
            "https://youtu.be/dQw4w9WgXcQ",
            "--dest",
            "/tmp/videos",
            "--yt-dlp",
            "/opt/yt-dlp",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.url.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"));
        assert_eq!(args.destination, Some(PathBuf::from("/tmp/videos")));
        assert_eq!(args.retriever, Some(PathBuf::from("/opt/yt-dlp")));
        assert!(args.verbose);
        assert!(args.config.is_none());
    }
}
