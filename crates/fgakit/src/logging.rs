//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry that renders the events emitted
//! by the fake engine, the permission cache and the snapshot recorder.
//!
//! # Log Format
//!
//! When JSON formatting is enabled, log entries are output as JSON objects:
//!
//! ```json
//! {"timestamp":"2026-01-15T10:30:00.000Z","level":"DEBUG","target":"fgakit_domain::cache","fields":{"message":"permission cache tag invalidated","tag":"user:user:1","removed":2}}
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fgakit::logging::{init_logging, LoggingConfig};
//!
//! init_logging(LoggingConfig::from_settings(&config.logging));
//! ```

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::config::LoggingSettings;

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
    /// Whether to include span events (enter/exit)
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// JSON output at the default level.
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    /// Human-readable output at the default level.
    pub fn text() -> Self {
        Self {
            json_format: false,
            ..Default::default()
        }
    }

    /// Builds a logging configuration from loaded settings.
    ///
    /// Unknown levels fall back to `INFO`; [`FgaKitConfig::validate`]
    /// rejects them before this point.
    ///
    /// [`FgaKitConfig::validate`]: crate::config::FgaKitConfig::validate
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            json_format: settings.json,
            default_level: Level::from_str(&settings.level).unwrap_or(Level::INFO),
            include_spans: false,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Include span enter/exit events, useful to follow `#[instrument]`ed
    /// engine and cache calls.
    pub fn with_spans(mut self) -> Self {
        self.include_spans = true;
        self
    }

    /// `RUST_LOG` when set, otherwise the configured level.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Only the first call in a process takes effect; later calls are ignored
/// so test binaries can call this from every test.
pub fn init_logging(config: LoggingConfig) {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let installed = if config.json_format {
        let layer = fmt::layer()
            .json()
            .with_span_events(config.span_events())
            .with_current_span(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        tracing::subscriber::set_global_default(registry.with(layer)).is_ok()
    } else {
        let layer = fmt::layer()
            .pretty()
            .with_span_events(config.span_events())
            .with_target(true);
        tracing::subscriber::set_global_default(registry.with(layer)).is_ok()
    };

    if installed {
        tracing::debug!(json = config.json_format, level = %config.default_level, "Logging initialized");
    }
}

/// A JSON subscriber writing every event to `writer`, for capturing toolkit
/// logs in tests.
pub fn json_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use fgakit_domain::{PermissionCache, PermissionCacheConfig};

    /// Collects everything written into a shared buffer.
    #[derive(Clone, Default)]
    struct CaptureWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CaptureWriter {
        fn lines(&self) -> Vec<serde_json::Value> {
            let buffer = self.buffer.lock().unwrap();
            String::from_utf8_lossy(&buffer)
                .lines()
                .filter(|line| !line.is_empty())
                .map(|line| serde_json::from_str(line).expect("log line should be JSON"))
                .collect()
        }
    }

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.json_format);
        assert_eq!(config.default_level, Level::INFO);
        assert!(!config.include_spans);
    }

    #[test]
    fn test_logging_config_builders() {
        let config = LoggingConfig::json().with_level(Level::DEBUG).with_spans();
        assert!(config.json_format);
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.span_events(), FmtSpan::ENTER | FmtSpan::EXIT);

        assert!(!LoggingConfig::text().json_format);
        assert_eq!(LoggingConfig::text().span_events(), FmtSpan::NONE);
    }

    #[test]
    fn test_from_settings() {
        let settings = LoggingSettings {
            level: "WARN".to_string(),
            json: true,
        };

        let config = LoggingConfig::from_settings(&settings);

        assert!(config.json_format);
        assert_eq!(config.default_level, Level::WARN);
    }

    #[test]
    fn test_from_settings_unknown_level_falls_back_to_info() {
        let settings = LoggingSettings {
            level: "verbose".to_string(),
            json: false,
        };

        assert_eq!(
            LoggingConfig::from_settings(&settings).default_level,
            Level::INFO
        );
    }

    #[test]
    fn test_cache_invalidation_logs_are_json() {
        let writer = CaptureWriter::default();
        let subscriber = json_subscriber(writer.clone());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            runtime.block_on(async {
                let cache =
                    PermissionCache::new(PermissionCacheConfig::default().with_enabled(true));
                cache
                    .put_permission("user:1", "viewer", "document:1", true)
                    .await;
                cache.invalidate_user("user:1").await;
            });
        });

        let lines = writer.lines();
        assert!(!lines.is_empty(), "should have captured log output");
        for json in &lines {
            assert!(json.get("level").is_some());
            assert!(json.get("target").is_some());
        }
        assert!(lines.iter().any(|json| json["target"]
            .as_str()
            .is_some_and(|target| target.starts_with("fgakit_domain::cache"))));
    }
}
