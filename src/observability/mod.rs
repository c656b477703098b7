//! Logging setup
//!
//! `RUST_LOG` wins over `log.level` when set.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::LogConfig;

/// Filter directive for a plain level such as `debug`
pub fn default_filter(level: &str) -> String {
    if level == "trace" {
        format!("wopi_server={level},tower_http=trace")
    } else {
        format!("wopi_server={level}")
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(&config.level))
            .with_context(|| format!("invalid log level {:?}", config.level))?,
    };

    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };
    let ansi = config.color && config.file.is_none();

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.pretty {
        fmt::layer().with_ansi(ansi).with_writer(writer).boxed()
    } else {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("info"), "wopi_server=info");
        assert_eq!(default_filter("trace"), "wopi_server=trace,tower_http=trace");
        assert!(EnvFilter::try_new(default_filter("debug")).is_ok());
    }
}
