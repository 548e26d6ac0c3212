// src/config.rs
// =============================================================================
// Crawl configuration.
//
// Everything the crawler needs to know is passed in one MirrorConfig value:
// base scope, output root, request timeout, politeness delay, user agent,
// and an optional depth limit. Nothing is a process-wide constant, so tests
// can point a crawl at a local fixture server.
//
// Where values come from (later wins):
// 1. Built-in defaults
// 2. An optional TOML file (--config)
// 3. Command-line flags
//
// Rust concepts:
// - serde + toml: deserialize a file straight into a struct
// - Option<T>::or: layering "flag if given, else file, else default"
// - thiserror: typed errors for every way configuration can be wrong
// =============================================================================

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DELAY_MS: u64 = 100;

pub fn default_user_agent() -> String {
    format!("site-mirror/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no base URL given; pass one on the command line or set base_url in the config file")]
    MissingBaseUrl,

    #[error("invalid base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("cannot pick an output directory for '{0}'; pass --output")]
    NoOutputDir(String),
}

// One layer of settings, every field optional
//
// This is both the shape of the TOML file and what the CLI produces,
// so merging is just field-by-field Option::or.
//
// Example file:
//   base_url = "https://www.example.org/files/"
//   output_dir = "files"
//   delay_ms = 250
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub delay_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub max_depth: Option<usize>,
}

impl Settings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fields set on `self` win; gaps are filled from `lower`
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            base_url: self.base_url.or(lower.base_url),
            output_dir: self.output_dir.or(lower.output_dir),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            delay_ms: self.delay_ms.or(lower.delay_ms),
            user_agent: self.user_agent.or(lower.user_agent),
            max_depth: self.max_depth.or(lower.max_depth),
        }
    }
}

// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Base scope; always ends with '/', no query or fragment
    pub base_url: Url,
    pub output_dir: PathBuf,
    /// Connect timeout, listing fetch timeout, and download idle timeout
    pub timeout: Duration,
    /// Pause after each downloaded file
    pub delay: Duration,
    pub user_agent: String,
    /// Deepest directory level to expand (base = 0); None = unlimited
    pub max_depth: Option<usize>,
}

impl MirrorConfig {
    // Config with defaults for everything except the two required inputs
    pub fn new(base_url: &str, output_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(MirrorConfig {
            base_url: normalize_base(base_url)?,
            output_dir: output_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            user_agent: default_user_agent(),
            max_depth: None,
        })
    }

    // Builds the final config from merged settings
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let raw = settings.base_url.ok_or(ConfigError::MissingBaseUrl)?;

        let mut config = MirrorConfig::new(&raw, settings.output_dir.unwrap_or_default())?
            .with_timeout(Duration::from_secs(settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
            .with_delay(Duration::from_millis(settings.delay_ms.unwrap_or(DEFAULT_DELAY_MS)))
            .with_max_depth(settings.max_depth);

        if config.output_dir.as_os_str().is_empty() {
            config.output_dir = default_output_dir(&config.base_url).ok_or(ConfigError::NoOutputDir(raw))?;
        }
        if let Some(user_agent) = settings.user_agent {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

// Parses the base URL and turns it into a directory prefix
//
// "https://host/docs"       -> "https://host/docs/"
// "https://host/docs/?x=1"  -> "https://host/docs/"
fn normalize_base(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::UnsupportedScheme(raw.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

// Output directory named after the last path segment, else the host
//
// "https://host/a/bhu-mandala/" -> "bhu-mandala"
// "https://host/"               -> "host"
fn default_output_dir(base: &Url) -> Option<PathBuf> {
    let segment = base
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .filter(|s| s != "." && s != ".." && !s.contains('/'));

    segment
        .or_else(|| base.host_str().map(str::to_string))
        .map(PathBuf::from)
}
