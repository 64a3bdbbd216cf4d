//! Process-wide tracing setup
//!
//! Events always go to stdout. With `log.file` set they are also written to
//! that file through a background writer, each sink with its own filter.

use crate::config::{LogConfig, LogFormat};
use crate::error::{Error, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;
type StdoutSubscriber = Layered<BoxedLayer<Registry>, Registry>;

/// Stdout layer with an optional file layer on top
pub type LogSubscriber = Layered<Option<BoxedLayer<StdoutSubscriber>>, StdoutSubscriber>;

/// Install the global subscriber described by `config`.
///
/// When logging to a file the returned guard must be held for the life of
/// the process; dropping it flushes and stops the background writer.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let (subscriber, guard) = build_subscriber(config)?;
    subscriber
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install log subscriber: {}", e)))?;
    Ok(guard)
}

/// Build the subscriber without installing it
pub fn build_subscriber(config: &LogConfig) -> Result<(LogSubscriber, Option<WorkerGuard>)> {
    let stdout: BoxedLayer<Registry> =
        fmt_layer(config.format, std::io::stdout, true, parse_filter(&config.level)?);

    let (file, guard): (Option<BoxedLayer<StdoutSubscriber>>, Option<WorkerGuard>) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| Error::Config(format!("Log file path has no file name: {}", path.display())))?;
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt_layer(config.format, writer, false, parse_filter(&config.file_level)?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Ok((tracing_subscriber::registry().with(stdout).with(file), guard))
}

fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

fn fmt_layer<S, W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LogConfig {
            level: "chat_relay=loud".into(),
            ..Default::default()
        };
        assert!(matches!(init_logging(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_file_filter_is_config_error() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            file: Some(dir.path().join("app.log")),
            file_level: "chat_relay=loud".into(),
            ..Default::default()
        };
        assert!(matches!(build_subscriber(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_file_gets_debug_events_alongside_stdout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        let config = LogConfig {
            file: Some(path.clone()),
            ..Default::default()
        };

        let (subscriber, guard) = build_subscriber(&config).unwrap();
        assert!(guard.is_some());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("only the file sees this");
            tracing::info!("both sinks see this");
        });
        // flushes the background writer
        drop(guard);

        let logged = std::fs::read_to_string(&path).unwrap();
        assert!(logged.contains("only the file sees this"));
        assert!(logged.contains("both sinks see this"));
        assert!(!logged.contains('\u{1b}'));
    }

    #[test]
    fn test_no_file_means_no_guard() {
        let (_, guard) = build_subscriber(&LogConfig::default()).unwrap();
        assert!(guard.is_none());
    }
}
