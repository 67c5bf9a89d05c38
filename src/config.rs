//! Client configuration: built-in defaults, an optional JSON file, the
//! environment and finally command-line flags, later layers winning.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::markdown::{RawHtml, RenderOptions};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/ask";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const CONFIG_DIR: &str = "ask-chat";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported endpoint scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Url,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub render: RenderOptions,
}

/// One layer of partial settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    /// `render` passes HTML embedded in answers through, `escape` shows it as text.
    pub raw_html: Option<RawHtml>,
    pub hard_breaks: Option<bool>,
    pub theme: Option<String>,
}

impl ConfigOverrides {
    /// Values set in `other` replace the ones in `self`.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            connect_timeout_secs: other.connect_timeout_secs.or(self.connect_timeout_secs),
            raw_html: other.raw_html.or(self.raw_html),
            hard_breaks: other.hard_breaks.or(self.hard_breaks),
            theme: other.theme.or(self.theme),
        }
    }

    /// Read the `ASK_CHAT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            endpoint: get("ASK_CHAT_ENDPOINT"),
            request_timeout_secs: parse_secs("ASK_CHAT_TIMEOUT_SECS", get("ASK_CHAT_TIMEOUT_SECS"))?,
            connect_timeout_secs: parse_secs(
                "ASK_CHAT_CONNECT_TIMEOUT_SECS",
                get("ASK_CHAT_CONNECT_TIMEOUT_SECS"),
            )?,
            raw_html: get("ASK_CHAT_RAW_HTML")
                .map(|v| {
                    v.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "ASK_CHAT_RAW_HTML",
                        value: v,
                    })
                })
                .transpose()?,
            hard_breaks: None,
            theme: get("ASK_CHAT_THEME"),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn parse_secs(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { key, value }))
        .transpose()
}

impl Config {
    /// Resolve the layered configuration.
    ///
    /// An explicit `file` must exist; the default location under the user's
    /// config directory is only read when present.
    pub fn load(file: Option<&Path>, cli: ConfigOverrides) -> Result<Self, ConfigError> {
        let from_file = match file {
            Some(path) => ConfigOverrides::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!("Loading config from {}", path.display());
                    ConfigOverrides::from_file(&path)?
                }
                None => ConfigOverrides::default(),
            },
        };

        let merged = from_file.merge(ConfigOverrides::from_env()?).merge(cli);
        Self::resolve(merged)
    }

    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let endpoint = normalize_endpoint(overrides.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT))?;

        let request_timeout_secs = overrides.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        let connect_timeout_secs = overrides.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        if connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "connect_timeout_secs",
                value: "0".to_string(),
            });
        }

        let defaults = RenderOptions::default();
        let render = RenderOptions {
            raw_html: overrides.raw_html.unwrap_or(defaults.raw_html),
            hard_breaks: overrides.hard_breaks.unwrap_or(defaults.hard_breaks),
            theme: overrides.theme.unwrap_or(defaults.theme),
        };

        Ok(Self {
            endpoint,
            request_timeout: Duration::from_secs(request_timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            render,
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Parse an endpoint URL; a bare host gets the `/ask` path.
pub fn normalize_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.path().is_empty() || url.path() == "/" {
        url.set_path("/ask");
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_resolve() {
        let config = Config::resolve(ConfigOverrides::default()).unwrap();
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.render.raw_html, RawHtml::Render);
        assert!(config.render.hard_breaks);
    }

    #[test]
    fn bare_host_gets_ask_path() {
        assert_eq!(normalize_endpoint("http://localhost:8080").unwrap().as_str(), "http://localhost:8080/ask");
        assert_eq!(
            normalize_endpoint("https://chat.example.com/api/ask").unwrap().as_str(),
            "https://chat.example.com/api/ask"
        );
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(matches!(normalize_endpoint("not a url"), Err(ConfigError::InvalidEndpoint { .. })));
        assert!(matches!(normalize_endpoint("ftp://example.com/ask"), Err(ConfigError::UnsupportedScheme(_))));
    }

    #[test]
    fn env_layer_parses_values() {
        let overrides = ConfigOverrides::from_lookup(lookup(&[
            ("ASK_CHAT_ENDPOINT", "http://10.0.0.2:5000"),
            ("ASK_CHAT_TIMEOUT_SECS", "5"),
            ("ASK_CHAT_RAW_HTML", "escape"),
            ("ASK_CHAT_THEME", "  "),
        ]))
        .unwrap();

        assert_eq!(overrides.endpoint.as_deref(), Some("http://10.0.0.2:5000"));
        assert_eq!(overrides.request_timeout_secs, Some(5));
        assert_eq!(overrides.connect_timeout_secs, None);
        assert_eq!(overrides.raw_html, Some(RawHtml::Escape));
        assert_eq!(overrides.theme, None);
    }

    #[test]
    fn env_layer_rejects_garbage() {
        let err = ConfigOverrides::from_lookup(lookup(&[("ASK_CHAT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ASK_CHAT_TIMEOUT_SECS", .. }));

        let err = ConfigOverrides::from_lookup(lookup(&[("ASK_CHAT_RAW_HTML", "sanitize")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ASK_CHAT_RAW_HTML", .. }));
    }

    #[test]
    fn later_layers_win() {
        let file = ConfigOverrides {
            endpoint: Some("http://file.example/ask".into()),
            request_timeout_secs: Some(30),
            theme: Some("InspiredGitHub".into()),
            ..Default::default()
        };
        let cli = ConfigOverrides {
            endpoint: Some("http://cli.example/ask".into()),
            raw_html: Some(RawHtml::Escape),
            ..Default::default()
        };

        let config = Config::resolve(file.merge(cli)).unwrap();
        assert_eq!(config.endpoint.as_str(), "http://cli.example/ask");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.render.raw_html, RawHtml::Escape);
        assert_eq!(config.render.theme, "InspiredGitHub");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let overrides = ConfigOverrides {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(Config::resolve(overrides), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn file_layer_reads_json() {
        let path = env::temp_dir().join(format!("ask-chat-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "endpoint": "http://file.example", "raw_html": "escape", "hard_breaks": false }"#).unwrap();

        let overrides = ConfigOverrides::from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(overrides.endpoint.as_deref(), Some("http://file.example"));
        assert_eq!(overrides.raw_html, Some(RawHtml::Escape));
        assert_eq!(overrides.hard_breaks, Some(false));
    }

    #[test]
    fn file_layer_rejects_unknown_keys() {
        let path = env::temp_dir().join(format!("ask-chat-config-bad-{}.json", std::process::id()));
        fs::write(&path, r#"{ "endpoit": "http://typo.example" }"#).unwrap();

        let err = ConfigOverrides::from_file(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
