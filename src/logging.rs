/// Structured logging setup using tracing
///
/// Diagnostics go to stderr so stdout carries only the step-by-step console output.
/// Auto-detects format: human-readable with ANSI colors when stderr is a terminal,
/// structured JSON when piped/redirected. An optional plain-text file layer
/// mirrors everything into config.log_file.

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use crate::config::Config;

/// Initialize tracing subscriber with stderr output plus optional file output
///
/// Log level from config.log_level (default: info)
/// RUST_LOG env var can override at runtime
pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (log_file, open_error) = match config.log_file.as_deref().map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    if std::io::stderr().is_terminal() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
            )
            .with(file_layer(log_file))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
            )
            .with(file_layer(log_file))
            .init();
    }

    if let Some(e) = open_error {
        tracing::warn!(
            log_file = config.log_file.as_deref().unwrap_or_default(),
            error = %e,
            "Could not open log file, logging to stderr only"
        );
    }
}

fn open_log_file(path: &str) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn file_layer<S>(file: Option<File>) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
    })
}
