use anyhow::{Context, Result};
use idstorm_config::{LogFormat, LogLevel, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer flushing; drop it only at process exit
#[must_use = "dropping the guard stops the file log writer"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Pick the filter directive: command line first, then `RUST_LOG`, then config.
pub fn filter_directive(cli_level: Option<&str>, rust_log: Option<&str>, config_level: LogLevel) -> String {
    cli_level
        .or(rust_log)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config_level.as_str().to_string())
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig, cli_level: Option<&str>) -> Result<LoggingGuard> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(cli_level, rust_log.as_deref(), config.level);
    let env_filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(config.format, config.include_location)];

    let file_guard = match &config.file {
        Some(path) => {
            let (layer, guard) = file_layer(path)?;
            layers.push(layer);
            Some(guard)
        }
        None => None,
    };

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(LoggingGuard { _file: file_guard })
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: Option<&str>) -> Result<()> {
    let env_filter = log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

fn stderr_layer(format: LogFormat, include_location: bool) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(include_location)
        .with_line_number(include_location);

    match format {
        LogFormat::Json => base.json().with_current_span(false).boxed(),
        LogFormat::Compact => base.compact().with_target(false).boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Text => base.with_target(false).boxed(),
    }
}

fn file_layer(path: &Path) -> Result<(BoxedLayer, WorkerGuard)> {
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file {} has no file name", path.display()))?;

    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();

    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        assert_eq!(
            filter_directive(Some("debug"), Some("warn"), LogLevel::Error),
            "debug"
        );
    }

    #[test]
    fn test_rust_log_beats_config() {
        assert_eq!(
            filter_directive(None, Some("idstorm_execution=trace"), LogLevel::Info),
            "idstorm_execution=trace"
        );
    }

    #[test]
    fn test_config_level_is_fallback() {
        assert_eq!(filter_directive(None, None, LogLevel::Warn), "warn");
        assert_eq!(filter_directive(Some("  "), None, LogLevel::Trace), "trace");
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        let (_layer, _guard) = file_layer(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
