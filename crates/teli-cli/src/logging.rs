use anyhow::Result;
use std::io::{self, IsTerminal};
use std::path::Path;
use teli_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Verbosity flags beat the configured level; `RUST_LOG` beats both except
/// in quiet mode.
pub fn filter_directive(verbose_level: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose_level {
        0 => configured.to_string(),
        // -v: debug without the per-connection hyper noise
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn".to_string(),
        _ => "trace".to_string(),
    }
}

/// Rotation prefix for a log file, e.g. "teli" from "teli.log"
pub fn rotation_prefix(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(stem, _)| stem).filter(|s| !s.is_empty()).unwrap_or(filename)
}

/// `RUST_LOG_JSON` decides when set; otherwise JSON is used when configured
/// or when stdout is not a terminal
pub fn json_choice(env: Option<&str>, configured: bool, stdout_tty: bool) -> bool {
    match env {
        Some(value) => value == "true",
        None => configured || !stdout_tty,
    }
}

fn json_enabled(config: &LoggingConfig) -> bool {
    let env = std::env::var("RUST_LOG_JSON").ok();
    json_choice(env.as_deref(), config.json, io::stdout().is_terminal())
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let directive = filter_directive(verbose_level, quiet, &config.level);
    let filter = if quiet {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    let json = json_enabled(config);
    let registry = Registry::default().with(filter);

    match config.file.as_deref() {
        Some(log_path) => {
            let file_appender = file_appender(log_path)?;
            if json {
                let json_layer = fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file_appender);
                registry.with(json_layer).init();
            } else {
                let fmt_layer = fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file_appender);
                registry.with(fmt_layer).init();
            }
        }
        None => {
            if json {
                let json_layer = fmt::layer()
                    .json()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(io::stderr);
                registry.with(json_layer).init();
            } else {
                let fmt_layer = fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(io::stderr);
                registry.with(fmt_layer).init();
            }
        }
    }

    Ok(())
}

/// Daily-rotated appender: teli.log becomes teli.2026-01-17 and so on
fn file_appender(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    Ok(RollingFileAppender::new(
        Rotation::DAILY,
        log_dir,
        rotation_prefix(log_filename),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, false, "warn"), "warn");
        assert!(filter_directive(1, false, "warn").starts_with("debug,"));
        assert_eq!(filter_directive(3, false, "warn"), "trace");
        assert_eq!(filter_directive(2, true, "info"), "error");
    }

    #[test]
    fn test_json_choice() {
        assert!(!json_choice(None, false, true));
        assert!(json_choice(None, false, false));
        assert!(json_choice(None, true, true));
        assert!(json_choice(Some("true"), false, true));
        assert!(!json_choice(Some("false"), true, false));
    }

    #[test]
    fn test_rotation_prefix() {
        assert_eq!(rotation_prefix("teli.log"), "teli");
        assert_eq!(rotation_prefix("teli.cli.log"), "teli.cli");
        assert_eq!(rotation_prefix("teli"), "teli");
        assert_eq!(rotation_prefix(".log"), ".log");
    }
}
