use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid server url {value:?}: {source}")]
    Url {
        value: String,
        source: url::ParseError,
    },
}

/// Client configuration: optional TOML file, overridden by `FACEFEED_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the detection server (default: http://localhost:3000).
    pub server_url: Url,
    /// Path of the Server-Sent Events endpoint relative to `server_url`.
    pub events_path: String,
    /// Maximum cards per gallery collection.
    pub gallery_capacity: usize,
    /// How long a toast stays visible.
    pub toast_ttl: Duration,
    /// Maximum number of toasts stacked at once.
    pub toast_limit: usize,
    /// Reconnection delay until the server advertises its own.
    pub reconnect: Duration,
    /// Timeout for REST calls and for establishing the event stream connection.
    pub request_timeout: Duration,
    /// Where `watch` writes the rendered gallery page after every event.
    pub snapshot_path: Option<PathBuf>,
}

/// On-disk form; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    events_path: Option<String>,
    gallery_capacity: Option<usize>,
    toast_ttl_secs: Option<u64>,
    toast_limit: Option<usize>,
    reconnect_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Load from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&text)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = env("FACEFEED_SERVER_URL")
            .or(file.server_url)
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        let server_url = Url::parse(&server_url).map_err(|source| ConfigError::Url {
            value: server_url.clone(),
            source,
        })?;

        Ok(Self {
            server_url,
            events_path: env("FACEFEED_EVENTS_PATH")
                .or(file.events_path)
                .unwrap_or_else(|| "/events".to_string()),
            gallery_capacity: env_parse(&env, "FACEFEED_GALLERY_CAPACITY")
                .or(file.gallery_capacity)
                .unwrap_or(facefeed_core::DEFAULT_CAPACITY)
                .max(1),
            toast_ttl: Duration::from_secs(
                env_parse(&env, "FACEFEED_TOAST_TTL_SECS")
                    .or(file.toast_ttl_secs)
                    .unwrap_or(5),
            ),
            toast_limit: env_parse(&env, "FACEFEED_TOAST_LIMIT")
                .or(file.toast_limit)
                .unwrap_or(5),
            reconnect: Duration::from_millis(
                env_parse(&env, "FACEFEED_RECONNECT_MS")
                    .or(file.reconnect_ms)
                    .unwrap_or(3000),
            ),
            request_timeout: Duration::from_secs(
                env_parse(&env, "FACEFEED_REQUEST_TIMEOUT_SECS")
                    .or(file.request_timeout_secs)
                    .unwrap_or(10),
            ),
            snapshot_path: env("FACEFEED_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .or(file.snapshot_path),
        })
    }

    /// Full URL of the event stream.
    pub fn events_url(&self) -> Result<Url, ConfigError> {
        self.server_url
            .join(&self.events_path)
            .map_err(|source| ConfigError::Url {
                value: self.events_path.clone(),
                source,
            })
    }
}

/// Unparseable values fall back to the next source, like a missing variable.
fn env_parse<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    env(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(FileConfig::default(), env_of(&[])).unwrap();
        assert_eq!(config.events_url().unwrap().as_str(), "http://localhost:3000/events");
        assert_eq!(config.gallery_capacity, 12);
        assert_eq!(config.toast_ttl, Duration::from_secs(5));
        assert_eq!(config.reconnect, Duration::from_millis(3000));
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            server_url = "http://nvr.lan:8080"
            gallery_capacity = 20
            toast_limit = 2
            "#,
        )
        .unwrap();
        let config = Config::resolve(
            file,
            env_of(&[("FACEFEED_GALLERY_CAPACITY", "6"), ("FACEFEED_SNAPSHOT_PATH", "/tmp/g.html")]),
        )
        .unwrap();
        assert_eq!(config.server_url.as_str(), "http://nvr.lan:8080/");
        assert_eq!(config.gallery_capacity, 6);
        assert_eq!(config.toast_limit, 2);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/g.html")));
    }

    #[test]
    fn test_bad_number_falls_back() {
        let config = Config::resolve(
            FileConfig::default(),
            env_of(&[("FACEFEED_GALLERY_CAPACITY", "lots")]),
        )
        .unwrap();
        assert_eq!(config.gallery_capacity, 12);
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        let err = Config::resolve(FileConfig::default(), env_of(&[("FACEFEED_SERVER_URL", "not a url")]));
        assert!(matches!(err, Err(ConfigError::Url { .. })));
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        assert!(toml::from_str::<FileConfig>("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facefeed.toml");
        std::fs::write(&path, "events_path = \"/api/stream\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert!(config.events_url().unwrap().path().ends_with("/api/stream"));
    }
}
