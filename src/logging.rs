//! Tracing subscriber setup.

use crate::config::LoggingSettings;
use crate::error::{PipelineError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `env_override` (usually `RUST_LOG`) wins over the configured directives.
pub fn resolve_filter(settings: &LoggingSettings, env_override: Option<String>) -> Result<EnvFilter> {
    let directives = env_override
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| settings.filter.clone());
    EnvFilter::try_new(&directives)
        .map_err(|e| PipelineError::Config(format!("Invalid log filter {:?}: {}", directives, e)))
}

/// Install the global tracing subscriber.
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let filter = resolve_filter(settings, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    let result = match &settings.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                PipelineError::Config(format!("Log file path {:?} has no file name", path))
            })?;
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(appender)
                        .with_ansi(false),
                )
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(settings.ansi))
            .try_init(),
    };

    result.map_err(|e| PipelineError::Config(format!("Failed to initialize logging: {}", e)))?;
    tracing::debug!("Logging initialized");
    Ok(())
}
