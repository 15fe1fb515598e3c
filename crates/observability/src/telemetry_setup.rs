use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            _ => Err(anyhow::anyhow!("unsupported log format: {s}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        };
        f.write_str(name)
    }
}

/// Subscriber settings. `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
    pub include_thread_id: bool,
    pub include_thread_name: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: true,
            include_thread_id: false,
            include_thread_name: false,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .with_context(|| format!("invalid log level: {}", self.level)),
        }
    }
}

/// Install the global subscriber. Events go to stderr so command output on
/// stdout stays machine-readable. Fails if a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id)
                .with_thread_names(config.include_thread_name);

            registry
                .with(fmt_layer)
                .try_init()
                .context("failed to install JSON log subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id)
                .with_thread_names(config.include_thread_name);

            registry
                .with(fmt_layer)
                .try_init()
                .context("failed to install pretty log subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_thread_ids(config.include_thread_id)
                .with_thread_names(config.include_thread_name);

            registry
                .with(fmt_layer)
                .try_init()
                .context("failed to install compact log subscriber")?;
        }
    }

    debug!(
        logging.format = %config.format,
        logging.level = %config.level,
        logging.location = config.include_location,
        "logging initialized"
    );

    Ok(())
}
