//! Logging setup: one file per day under the logs directory, lines formatted
//! as `<timestamp> - <LEVEL> - <message>` with `WARNING` for warnings.

use std::fmt;
use std::path::Path;

use chrono::Local;
use quicksave_core::LogLevel;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{
        FmtContext, FormatEvent, FormatFields,
        format::Writer,
        time::FormatTime,
    },
    prelude::*,
    registry::LookupSpan,
};

use crate::error::{AppError, Result};

/// Default filter directive when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "quicksave=info,quicksave_core=info";

/// Extension of the daily log files (`YYYY-MM-DD.log`).
pub const LOG_FILE_SUFFIX: &str = "log";

/// Formats timestamps in the local timezone.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S,%3f"))
    }
}

/// `<timestamp> - <LEVEL> - <message>`
pub struct DashFormat;

impl<S, N> FormatEvent<S, N> for DashFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        LocalTimer.format_time(&mut writer)?;
        write!(
            writer,
            " - {} - ",
            LogLevel::from(*event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the program. The terminal only gets log output with
/// `verbose`; otherwise it is left to the step display.
pub fn init_logging(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(logs_dir)
        .map_err(|e| AppError::Logging(format!("cannot open log file: {}", e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_timer(LocalTimer)
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::DEBUG)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(DashFormat),
        )
        .try_init()
        .map_err(|e| AppError::Logging(format!("failed to set global subscriber: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_dash_format_line() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .event_format(DashFormat)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Renamed Talk.ar-en.vtt to Talk.ar.vtt");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let line = output.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(3, " - ").collect();
        assert_eq!(parts.len(), 3);
        // 2024-06-23 10:00:00,123
        assert_eq!(parts[0].len(), 23);
        assert_eq!(&parts[0][19..20], ",");
        assert_eq!(parts[1], "WARNING");
        assert_eq!(parts[2], "Renamed Talk.ar-en.vtt to Talk.ar.vtt");
    }

    // The only test in this binary that installs the global subscriber.
    #[test]
    fn test_events_reach_daily_file_before_guard_drops() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let guard = init_logging(temp_dir.path(), false).unwrap();
        tracing::error!("Application error: merge failed");
        drop(guard);

        let files: Vec<std::path::PathBuf> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().to_string();
        // YYYY-MM-DD.log
        assert_eq!(name.len(), 14);
        assert!(name.ends_with(".log"));

        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert!(contents.contains(" - ERROR - Application error: merge failed"));
    }

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("quicksave_core=info"));
    }
}
