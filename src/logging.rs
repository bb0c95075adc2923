//! Logging setup.
//!
//! The terminal UI owns the screen, so in that mode logs go to a file only.
//! Headless sessions log to stdout, and also to a file when one is given.
//! Both outputs use the level from `RUST_LOG`, defaulting to `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log file used by the terminal UI when none is configured.
pub const DEFAULT_LOG_FILE: &str = "streamchart.log";

/// Where log output should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub stdout: bool,
    pub file: Option<PathBuf>,
}

impl LogTarget {
    /// Resolve the targets for a session.
    pub fn for_session(headless: bool, log_file: Option<&Path>) -> Self {
        if headless {
            Self {
                stdout: true,
                file: log_file.map(Path::to_path_buf),
            }
        } else {
            Self {
                stdout: false,
                file: Some(
                    log_file
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
                ),
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the file
/// writer.
pub fn init(target: &LogTarget) -> Option<WorkerGuard> {
    let (file_layer, guard) = match &target.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = target.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_mode_logs_to_file_only() {
        let target = LogTarget::for_session(false, None);
        assert!(!target.stdout);
        assert_eq!(target.file, Some(PathBuf::from(DEFAULT_LOG_FILE)));

        let target = LogTarget::for_session(false, Some(Path::new("/tmp/chart.log")));
        assert_eq!(target.file, Some(PathBuf::from("/tmp/chart.log")));
    }

    #[test]
    fn test_headless_mode_logs_to_stdout() {
        let target = LogTarget::for_session(true, None);
        assert!(target.stdout);
        assert_eq!(target.file, None);

        let target = LogTarget::for_session(true, Some(Path::new("run.log")));
        assert!(target.stdout);
        assert_eq!(target.file, Some(PathBuf::from("run.log")));
    }
}
