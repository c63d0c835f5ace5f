//! Configuration loading: built-in defaults, then a TOML file, then
//! command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use quicksave_core::PipelineConfig;
use tracing::debug;

use crate::cli::Args;
use crate::error::{AppError, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

/// `<config_dir>/quicksave/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("quicksave").join(CONFIG_FILE_NAME))
}

fn parse(contents: &str, path: &Path) -> Result<PipelineConfig> {
    toml::from_str(contents)
        .map_err(|e| AppError::Config(format!("invalid config file {}: {}", path.display(), e)))
}

/// Load the pipeline configuration.
///
/// An explicitly given file must exist. The default file is optional; when it
/// is missing the built-in defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(PipelineConfig::default()),
        },
    };

    match fs::read_to_string(&path) {
        Ok(contents) => {
            debug!("Loading configuration from {}", path.display());
            parse(&contents, &path)
        }
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(PipelineConfig::default())
        }
        Err(e) => Err(AppError::Config(format!(
            "cannot read config file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Apply command-line (and environment) overrides on top of `config`.
pub fn apply_overrides(mut config: PipelineConfig, args: &Args) -> PipelineConfig {
    if let Some(destination) = &args.destination {
        config.destination_dir = destination.clone();
    }
    if let Some(muxer) = &args.muxer {
        config.muxer_path = muxer.clone();
    }
    if let Some(retriever) = &args.retriever {
        config.retriever_path = retriever.clone();
    }
    if let Some(logs_dir) = &args.logs_dir {
        config.logs_dir = logs_dir.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse(
            "destination_dir = \"/srv/videos\"\nsubtitle_languages = [\"en\"]\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.destination_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.subtitle_languages, ["en"]);
        assert_eq!(config.max_height, PipelineConfig::default().max_height);
        assert_eq!(config.logs_dir, PipelineConfig::default().logs_dir);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let err = parse("max_height = \"tall\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "max_height = 720\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.max_height, 720);
    }

    #[test]
    fn test_overrides_win() {
        let args = Args::try_parse_from([
            "quicksave",
            "--dest",
            "/downloads",
            "--muxer",
            "/usr/local/bin/mkvmerge",
            "--logs-dir",
            "/var/log/quicksave",
        ])
        .unwrap();
        let base = PipelineConfig {
            destination_dir: PathBuf::from("/from-file"),
            ..Default::default()
        };

        let config = apply_overrides(base, &args);
        assert_eq!(config.destination_dir, PathBuf::from("/downloads"));
        assert_eq!(config.muxer_path, PathBuf::from("/usr/local/bin/mkvmerge"));
        assert_eq!(config.logs_dir, PathBuf::from("/var/log/quicksave"));
        assert_eq!(
            config.retriever_path,
            PipelineConfig::default().retriever_path
        );
    }
}
