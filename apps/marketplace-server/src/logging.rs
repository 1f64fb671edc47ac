use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::{LogFormat, LoggingConfig};

/// `RUST_LOG`, when set, wins over the configured level.
fn build_filter(cfg: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&cfg.level).map_err(|e| anyhow!("invalid logging.level '{}': {e}", cfg.level))
}

/// Install the global subscriber. Logs go to stderr so stdout stays usable for
/// `--print-config` and `seed` output.
///
/// # Errors
/// Fails on an unparsable level or when a subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = build_filter(cfg)?;
    let registry = Registry::default().with(filter);
    let installed = match cfg.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        temp_env::with_var_unset("RUST_LOG", || {
            let cfg = LoggingConfig {
                level: "donations=debug,info".to_owned(),
                format: LogFormat::Json,
            };
            let filter = build_filter(&cfg).unwrap();
            assert!(filter.to_string().contains("donations=debug"));
        });
    }

    #[test]
    fn rust_log_overrides_config() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            let filter = build_filter(&LoggingConfig::default()).unwrap();
            assert_eq!(filter.to_string(), "warn");
        });
    }

    #[test]
    fn garbage_level_is_rejected() {
        temp_env::with_var_unset("RUST_LOG", || {
            let cfg = LoggingConfig {
                level: "donations=loud".to_owned(),
                format: LogFormat::Pretty,
            };
            assert!(build_filter(&cfg).is_err());
        });
    }
}
