// ============================================================
// Layer 6 — Logging Bootstrap
// ============================================================
// Configures the process-wide tracing subscriber from
// config/logging.yaml. The document follows the dictConfig
// shape: formatters, handlers, named loggers, and a root level.
//
// Recognized options:
//   - root.level and loggers.<name>.level → filter directives
//     (logger names map onto tracing targets; dots become "::",
//     hyphens become underscores)
//   - a FileHandler with a filename → log lines are teed to that
//     file in addition to stdout
//   - the console formatter's format string → whether the target
//     is shown ("%(name)s" present or absent)
//
// RUST_LOG, when set, overrides the YAML-derived filter entirely.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

// ─── Document shape ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// dictConfig schema version; parsed but not interpreted
    pub version: Option<u32>,

    #[serde(default)]
    pub formatters: HashMap<String, FormatterSettings>,

    #[serde(default)]
    pub handlers: HashMap<String, HandlerSettings>,

    #[serde(default)]
    pub loggers: HashMap<String, LoggerSettings>,

    pub root: Option<LoggerSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatterSettings {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerSettings {
    /// Handler class name, e.g. "logging.StreamHandler" or
    /// "logging.FileHandler"
    pub class: Option<String>,

    pub level: Option<String>,

    pub formatter: Option<String>,

    /// Only meaningful for file handlers
    pub filename: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggerSettings {
    pub level: Option<String>,

    #[serde(default)]
    pub handlers: Vec<String>,
}

impl LoggingConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Cannot read logging config '{}'", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Cannot parse logging config '{}'", path.display()))
    }

    /// Build the EnvFilter directive string: the root level first,
    /// then one `target=level` directive per named logger, in
    /// sorted order.
    pub fn filter_directives(&self) -> String {
        let root = self
            .root
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .and_then(map_level)
            .unwrap_or("info");

        let mut parts = vec![root.to_string()];

        let mut names: Vec<&String> = self.loggers.keys().collect();
        names.sort();
        for name in names {
            match self.loggers[name].level.as_deref().map(|l| (l, map_level(l))) {
                Some((_, Some(level))) => {
                    parts.push(format!("{}={}", logger_target(name), level));
                }
                Some((raw, None)) => {
                    tracing::warn!("Unknown log level '{}' for logger '{}', ignoring", raw, name);
                }
                None => {}
            }
        }

        parts.join(",")
    }

    /// The filename of the first file handler, if any.
    pub fn log_file(&self) -> Option<PathBuf> {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        names.into_iter().find_map(|name| {
            let handler = &self.handlers[name];
            let is_file = handler
                .class
                .as_deref()
                .map(|c| c.contains("FileHandler"))
                .unwrap_or(false);
            if is_file { handler.filename.clone() } else { None }
        })
    }

    /// Whether the console format string asks for the logger name.
    /// Python's default format includes it, so absence of any
    /// formatter information means "show it".
    pub fn console_shows_target(&self) -> bool {
        let console_formatter = self
            .handlers
            .values()
            .find(|h| {
                h.class
                    .as_deref()
                    .map(|c| c.contains("StreamHandler"))
                    .unwrap_or(false)
            })
            .and_then(|h| h.formatter.as_deref());

        match console_formatter.and_then(|name| self.formatters.get(name)) {
            Some(f) => f
                .format
                .as_deref()
                .map(|fmt| fmt.contains("%(name)"))
                .unwrap_or(true),
            None => true,
        }
    }
}

// ─── Level mapping ────────────────────────────────────────────────────────────

/// Map a dictConfig level name onto a tracing level directive.
fn map_level(level: &str) -> Option<&'static str> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "notset" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        _ => None,
    }
}

/// Logger names come from the Python-style document; tracing
/// targets use `::` separators and underscores.
fn logger_target(name: &str) -> String {
    name.replace('-', "_").replace('.', "::")
}

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Read the logging document and install the global subscriber.
/// A missing or malformed document is fatal for the whole run.
pub fn init_from_file(path: impl AsRef<Path>) -> Result<()> {
    let config = LoggingConfig::from_file(path)?;
    install(&config)
}

fn install(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.filter_directives()),
    };

    let show_target = config.console_shows_target();

    match config.log_file() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Cannot create log dir '{}'", parent.display()))?;
                }
            }
            let file = fs::File::create(&path)
                .with_context(|| format!("Cannot open log file '{}'", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stdout.and(Arc::new(file)))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;
        }
    }

    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
version: 1
formatters:
  standard:
    format: \"%(asctime)s - %(levelname)s - %(message)s\"
handlers:
  console:
    class: logging.StreamHandler
    level: DEBUG
    formatter: standard
  file:
    class: logging.FileHandler
    filename: logs/app.log
loggers:
  my_app:
    level: INFO
    handlers: [console, file]
root:
  level: WARNING
";

    #[test]
    fn test_filter_directives() {
        let cfg: LoggingConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.filter_directives(), "warn,my_app=info");
    }

    #[test]
    fn test_directives_default_to_info_root() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.filter_directives(), "info");
    }

    #[test]
    fn test_log_file_detection() {
        let cfg: LoggingConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.log_file(), Some(PathBuf::from("logs/app.log")));

        let cfg: LoggingConfig =
            serde_yaml::from_str("handlers:\n  console:\n    class: logging.StreamHandler\n")
                .unwrap();
        assert_eq!(cfg.log_file(), None);
    }

    #[test]
    fn test_console_target_flag() {
        // Sample format omits %(name)s → hide the target
        let cfg: LoggingConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(!cfg.console_shows_target());

        // No formatter info at all → Python's default includes the name
        let cfg = LoggingConfig::default();
        assert!(cfg.console_shows_target());
    }

    #[test]
    fn test_map_level() {
        assert_eq!(map_level("DEBUG"), Some("debug"));
        assert_eq!(map_level("warning"), Some("warn"));
        assert_eq!(map_level("CRITICAL"), Some("error"));
        assert_eq!(map_level("verbose"), None);
    }

    #[test]
    fn test_logger_target_mapping() {
        assert_eq!(logger_target("my_app"), "my_app");
        assert_eq!(logger_target("vision-voice-pipeline"), "vision_voice_pipeline");
        assert_eq!(logger_target("app.audio"), "app::audio");
    }
}
