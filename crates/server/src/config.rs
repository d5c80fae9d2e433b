//! Service configuration and logging setup.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

pub const DEFAULT_CONFIG_PATH: &str = "docsan.json";
pub const DEFAULT_PORT: u16 = 8080;

const DEFAULT_LOG_LEVEL: &str = "debug";
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file, written in addition to stderr. Truncated on start.
    pub filename: Option<String>,
    /// Level or `EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filename: None, level: DEFAULT_LOG_LEVEL.to_string() }
    }
}

/// Contents of the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub logging: LoggingConfig,
    /// Meta names kept in document records
    pub meta_tags: Vec<String>,
    pub json_pretty: bool,
    pub max_body_bytes: usize,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            meta_tags: Vec::new(),
            json_pretty: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Reads and parses the config file. A missing file is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("fail to read file {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("fail to unmarshal from file {}", path.display()))
    }
}

/// Port from the `PORT` variable, else the command line, else 8080.
pub fn resolve_port(env_port: Option<&str>, arg_port: Option<u16>) -> anyhow::Result<u16> {
    match env_port.map(str::trim).filter(|port| !port.is_empty()) {
        Some(port) => port.parse().with_context(|| format!("invalid PORT value: {port}")),
        None => Ok(arg_port.unwrap_or(DEFAULT_PORT)),
    }
}

/// Installs the global subscriber. Logs go to stderr and, when configured,
/// to the log file as well.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.level.to_ascii_lowercase()))
        .with_context(|| format!("invalid log level: {}", logging.level))?;

    let filename = logging.filename.as_deref().filter(|name| !name.is_empty());
    let writer = match filename {
        Some(name) => {
            let file = File::create(name).with_context(|| format!("failed to create file {name}"))?;
            BoxMakeWriter::new(io::stderr.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(filename.is_none())
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"{
                "logging": {"filename": "docsan.log", "level": "INFO"},
                "meta_tags": ["docid", "author"],
                "json_pretty": true,
                "max_body_bytes": 1024,
                "timeout_secs": 5
            }"#,
        );
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.filename.as_deref(), Some("docsan.log"));
        assert_eq!(config.logging.level, "INFO");
        assert_eq!(config.meta_tags, vec!["docid", "author"]);
        assert!(config.json_pretty);
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_load_defaults() {
        let file = write_config(r#"{"meta_tags": ["docid"]}"#);
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.logging.level, "debug");
        assert!(!config.json_pretty);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/docsan.json")).unwrap_err();
        assert!(err.to_string().contains("fail to read file"));
    }

    #[test]
    fn test_load_invalid_json() {
        let file = write_config("{meta_tags: }");
        assert!(ServerConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_resolve_port() {
        assert_eq!(resolve_port(Some("9090"), Some(7000)).unwrap(), 9090);
        assert_eq!(resolve_port(Some(""), Some(7000)).unwrap(), 7000);
        assert_eq!(resolve_port(None, None).unwrap(), DEFAULT_PORT);
        assert!(resolve_port(Some("http"), None).is_err());
    }
}
