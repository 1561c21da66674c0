use std::path::{Path, PathBuf};
use std::time::Duration;

use loginguard_core::nav::DEFAULT_SITE;
use loginguard_core::PolicyKind;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SERVICES_URL: &str = "https://admin.telcoware.com/services";

#[derive(Error, Debug)]
pub enum ConfigError {
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
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file backing durable and session storage.
    pub db_path: PathBuf,
    /// Scope of session storage (the intro flag).
    pub session_id: String,
    /// Lockout policy for the throttle.
    pub policy: PolicyKind,
    /// Countdown tick period.
    pub tick_interval_ms: u64,
    /// Endpoint listing sibling services (`?site=<key>` is appended).
    pub services_url: String,
    /// Site key used when the site config cannot be read.
    pub fallback_site: String,
    /// Timeout for navigation HTTP requests.
    pub http_timeout_secs: u64,
}

/// On-disk form: every field optional, missing ones take defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    db_path: Option<PathBuf>,
    session_id: Option<String>,
    policy: Option<PolicyKind>,
    tick_interval_ms: Option<u64>,
    services_url: Option<String>,
    fallback_site: Option<String>,
    http_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            session_id: "default".to_string(),
            policy: PolicyKind::default(),
            tick_interval_ms: 1000,
            services_url: DEFAULT_SERVICES_URL.to_string(),
            fallback_site: DEFAULT_SITE.to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply `LOGINGUARD_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            cfg.apply_file(&text, path)?;
            tracing::debug!(path = %path.display(), "loaded config file");
        }
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Storage namespace for this session's session-scoped values.
    pub fn session_namespace(&self) -> String {
        format!("session:{}", self.session_id)
    }

    fn apply_file(&mut self, text: &str, path: &Path) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(v) = file.db_path {
            self.db_path = v;
        }
        if let Some(v) = file.session_id {
            self.session_id = v;
        }
        if let Some(v) = file.policy {
            self.policy = v;
        }
        if let Some(v) = file.tick_interval_ms {
            self.tick_interval_ms = v;
        }
        if let Some(v) = file.services_url {
            self.services_url = v;
        }
        if let Some(v) = file.fallback_site {
            self.fallback_site = v;
        }
        if let Some(v) = file.http_timeout_secs {
            self.http_timeout_secs = v;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay `LOGINGUARD_*` values from `var`. A value that does not parse
    /// is an error, not a silent fallback to the default.
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = var("LOGINGUARD_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("LOGINGUARD_SESSION_ID") {
            self.session_id = v;
        }
        if let Some(v) = var("LOGINGUARD_POLICY") {
            self.policy = v.parse().map_err(|message| ConfigError::Invalid {
                key: "LOGINGUARD_POLICY",
                message,
            })?;
        }
        if let Some(v) = var("LOGINGUARD_TICK_MS") {
            self.tick_interval_ms = parse_u64("LOGINGUARD_TICK_MS", &v)?;
        }
        if let Some(v) = var("LOGINGUARD_SERVICES_URL") {
            self.services_url = v;
        }
        if let Some(v) = var("LOGINGUARD_FALLBACK_SITE") {
            self.fallback_site = v;
        }
        if let Some(v) = var("LOGINGUARD_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_u64("LOGINGUARD_HTTP_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("loginguard")
        .join("storage.db")
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        key,
        message: format!("{value:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.policy, PolicyKind::Rearm);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
        assert_eq!(cfg.fallback_site, "admin");
        assert_eq!(cfg.services_url, DEFAULT_SERVICES_URL);
        assert!(cfg.db_path.ends_with("loginguard/storage.db"));
        assert_eq!(cfg.session_namespace(), "session:default");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut cfg = Config::default();
        cfg.apply_file(
            "policy = \"edge\"\ntick_interval_ms = 250\nfallback_site = \"ops\"\n",
            Path::new("loginguard.toml"),
        )
        .unwrap();
        assert_eq!(cfg.policy, PolicyKind::Edge);
        assert_eq!(cfg.tick_interval_ms, 250);
        assert_eq!(cfg.fallback_site, "ops");
        assert_eq!(cfg.http_timeout_secs, 10);
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_file("lockout_minutes = 3\n", Path::new("loginguard.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_tick_interval_never_zero() {
        let cfg = Config {
            tick_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/loginguard.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_every_key() {
        let mut cfg = Config::default();
        cfg.apply_vars(vars(&[
            ("LOGINGUARD_DB_PATH", "/var/lib/loginguard/kv.db"),
            ("LOGINGUARD_SESSION_ID", "tab-7"),
            ("LOGINGUARD_POLICY", "edge"),
            ("LOGINGUARD_TICK_MS", "250"),
            ("LOGINGUARD_SERVICES_URL", "http://127.0.0.1:8080/services"),
            ("LOGINGUARD_FALLBACK_SITE", "ops"),
            ("LOGINGUARD_HTTP_TIMEOUT_SECS", " 3 "),
        ]))
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/loginguard/kv.db"));
        assert_eq!(cfg.session_namespace(), "session:tab-7");
        assert_eq!(cfg.policy, PolicyKind::Edge);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(250));
        assert_eq!(cfg.services_url, "http://127.0.0.1:8080/services");
        assert_eq!(cfg.fallback_site, "ops");
        assert_eq!(cfg.http_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut cfg = Config::default();
        cfg.apply_file("tick_interval_ms = 500\n", Path::new("loginguard.toml"))
            .unwrap();
        cfg.apply_vars(vars(&[("LOGINGUARD_TICK_MS", "2000")])).unwrap();
        assert_eq!(cfg.tick_interval_ms, 2000);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        for (key, value) in [
            ("LOGINGUARD_POLICY", "strict"),
            ("LOGINGUARD_TICK_MS", "fast"),
            ("LOGINGUARD_TICK_MS", "-5"),
            ("LOGINGUARD_HTTP_TIMEOUT_SECS", "10s"),
        ] {
            let mut cfg = Config::default();
            let err = cfg.apply_vars(vars(&[(key, value)])).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { key: k, .. } if *k == key),
                "{key}={value}: {err}"
            );
        }
    }

    #[test]
    fn test_load_reads_process_env() {
        // The only test in this crate that touches these variables.
        std::env::set_var("LOGINGUARD_SESSION_ID", "from-env");
        std::env::set_var("LOGINGUARD_TICK_MS", "not-a-number");
        let err = Config::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOGINGUARD_TICK_MS", .. }));

        std::env::set_var("LOGINGUARD_TICK_MS", "750");
        let cfg = Config::load(None);
        std::env::remove_var("LOGINGUARD_SESSION_ID");
        std::env::remove_var("LOGINGUARD_TICK_MS");

        let cfg = cfg.unwrap();
        assert_eq!(cfg.session_id, "from-env");
        assert_eq!(cfg.tick_interval_ms, 750);
    }
}
