/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};

/// Effective level after applying the verbose shorthand
pub fn effective_level(config: &LoggingConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Install the global subscriber described by `config`
///
/// Console output goes to stderr so stdout only carries command results
/// (tables or `--json` documents). With `log_file` set, events are written
/// there as one JSON object per line instead. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(effective_level(config))?;

    match config.log_file.as_deref() {
        Some(path) => {
            let file = create_log_file(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(json_file_layer(file))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer())
                .init();
        }
    }

    Ok(())
}

fn env_filter(level: Level) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("rmbridge={}", level)))
        .map_err(|e| BridgeError::Configuration(format!("Invalid log filter: {}", e)))
}

fn create_log_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| {
        BridgeError::Configuration(format!("Cannot create log file {}: {}", path.display(), e))
    })
}

/// Compact human-readable events on stderr
fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
}

/// One JSON object per event, with source locations and span timings
fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rmbridge=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}
