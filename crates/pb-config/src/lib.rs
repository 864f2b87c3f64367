//! # pb-config
//!
//! Layered settings: built-in defaults, then an optional `pinboard.toml`
//! (or any format `config` understands), then `PINBOARD__*` environment
//! variables, e.g. `PINBOARD__SERVER__PORT=9000` or
//! `PINBOARD__REMOTE__DATABASE_URL=sqlite://pins.db?mode=rwc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use pb_core::Language;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const ENV_PREFIX: &str = "PINBOARD";
pub const DEFAULT_FILE: &str = "pinboard";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    /// Holds the interaction blobs (`state/`) and uploads (`media/`)
    pub data_dir: PathBuf,
    pub language: Language,
    pub log: LogSettings,
    pub auth: AuthSettings,
    /// Absent: demo mode
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
    /// Absent: autofill disabled
    #[serde(default)]
    pub gemini: Option<GeminiSettings>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoteSettings {
    pub database_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct GeminiSettings {
    #[serde(deserialize_with = "secret")]
    pub api_key: SecretString,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(deserialize_with = "secret")]
    pub salt: SecretString,
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Loads `.env`, then reads `pinboard.*` from the working directory and
    /// the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(Some(Path::new(DEFAULT_FILE)), env)
    }

    /// Builds settings from an optional file and an explicit environment map.
    pub fn from_sources(file: Option<&Path>, env: HashMap<String, String>) -> Result<Self, ConfigError> {
        let gemini_fallback = env.get("GEMINI_API_KEY").cloned();

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("data_dir", "./data")?
            .set_default("language", "es")?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info")?
            .set_default("auth.salt", "pinboard")?;

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(&path.to_string_lossy()).required(false));
        }

        let source: config::Map<String, String> = env.into_iter().collect();
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(source)),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if settings.gemini.is_none() {
            if let Some(key) = gemini_fallback.filter(|k| !k.trim().is_empty()) {
                settings.gemini = Some(GeminiSettings { api_key: SecretString::from(key), model: default_model() });
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            if remote.database_url.trim().is_empty() {
                return Err(ConfigError::Invalid { key: "remote.database_url", reason: "must not be empty".into() });
            }
            if remote.poll_interval_ms == 0 {
                return Err(ConfigError::Invalid { key: "remote.poll_interval_ms", reason: "must be positive".into() });
            }
        }
        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_select_demo_mode() {
        let s = Settings::from_sources(None, HashMap::new()).unwrap();
        assert_eq!(s.bind_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(s.language, Language::Es);
        assert_eq!(s.log.format, LogFormat::Pretty);
        assert!(s.remote.is_none());
        assert!(s.gemini.is_none());
        assert_eq!(s.media_dir(), PathBuf::from("./data/media"));
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let s = Settings::from_sources(
            None,
            env(&[
                ("PINBOARD__SERVER__PORT", "9000"),
                ("PINBOARD__LOG__FORMAT", "json"),
                ("PINBOARD__LANGUAGE", "en"),
                ("PINBOARD__REMOTE__DATABASE_URL", "sqlite::memory:"),
                ("UNRELATED", "x"),
            ]),
        )
        .unwrap();
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.log.format, LogFormat::Json);
        assert_eq!(s.language, Language::En);
        let remote = s.remote.unwrap();
        assert_eq!(remote.database_url, "sqlite::memory:");
        assert_eq!(remote.poll_interval_ms, 1500);
    }

    #[test]
    fn file_values_sit_between_defaults_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pinboard.toml");
        std::fs::write(&path, "data_dir = \"/srv/pins\"\n[server]\nport = 7000\n[gemini]\napi_key = \"from-file\"\n").unwrap();

        let s = Settings::from_sources(Some(&path), env(&[("PINBOARD__SERVER__PORT", "7001")])).unwrap();
        assert_eq!(s.server.port, 7001);
        assert_eq!(s.data_dir, PathBuf::from("/srv/pins"));
        let gemini = s.gemini.unwrap();
        assert_eq!(gemini.api_key.expose_secret(), "from-file");
        assert_eq!(gemini.model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn gemini_key_falls_back_to_the_plain_variable() {
        let s = Settings::from_sources(None, env(&[("GEMINI_API_KEY", "abc")])).unwrap();
        assert_eq!(s.gemini.unwrap().api_key.expose_secret(), "abc");
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let s = Settings::from_sources(None, env(&[("PINBOARD__AUTH__SALT", "hunter2")])).unwrap();
        assert_eq!(s.auth.salt.expose_secret(), "hunter2");
        assert!(!format!("{s:?}").contains("hunter2"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = Settings::from_sources(
            None,
            env(&[
                ("PINBOARD__REMOTE__DATABASE_URL", "sqlite::memory:"),
                ("PINBOARD__REMOTE__POLL_INTERVAL_MS", "0"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "remote.poll_interval_ms", .. }));
    }
}
