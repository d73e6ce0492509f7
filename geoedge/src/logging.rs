//! Tracing subscriber setup for GeoEdge binaries.
//!
//! Log records go to a session file (truncated at startup) and, optionally,
//! to stdout. Filtering follows `RUST_LOG`, defaulting to `info`.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking file writer alive.
///
/// Dropping the guard flushes pending records and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// * `log_dir` / `log_file` - destination of the session log
/// * `stdout_enabled` - also print to stdout; the CLI turns this off when it
///   writes a JSON response to stdout
/// * `debug` - force `debug` level regardless of `RUST_LOG`
///
/// Fails if the directory cannot be created or the file cannot be truncated.
pub fn init_logging(
    log_dir: &str,
    log_file: &str,
    stdout_enabled: bool,
    debug: bool,
) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(Path::new(log_dir).join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    let stdout_layer = stdout_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Default log file name inside the configured log directory.
pub fn default_log_file() -> &'static str {
    "geoedge.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_appender::non_blocking::NonBlocking;

    #[test]
    fn test_default_log_file() {
        assert_eq!(default_log_file(), "geoedge.log");
    }

    #[test]
    fn test_debug_filter_overrides_environment() {
        let filter = env_filter(true);
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_guard_wraps_worker_guard() {
        // init_logging installs a global subscriber, so only the guard is
        // exercised here.
        let (writer, guard) = NonBlocking::new(io::sink());
        drop(writer);
        let _guard = LoggingGuard { _file_guard: guard };
    }
}
