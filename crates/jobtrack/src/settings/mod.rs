//! Application settings loaded from a TOML file and environment overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level settings for the jobtrack backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server binds to.
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 signing secret for issued tokens.
    pub jwt_secret: String,
    /// Expected token issuer.
    pub issuer: String,
    /// Expected token audience.
    pub audience: String,
    /// Lifetime of issued tokens, in minutes.
    pub token_ttl_minutes: i64,
    /// Idle timeout for server-held session credentials, in minutes.
    pub session_idle_minutes: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8090".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/jobtrack.db"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            // Placeholder; deployments must override via config or env.
            jwt_secret: "insecure-dev-secret".to_string(),
            issuer: "jobtrack".to_string(),
            audience: "jobtrack".to_string(),
            token_ttl_minutes: 60,
            session_idle_minutes: 30,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus `JOBTRACK_*` env vars.
    ///
    /// Env overrides use `__` as the section separator, e.g.
    /// `JOBTRACK_AUTH__JWT_SECRET`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Toml),
            );
        }

        let cfg = builder
            .add_source(
                config::Environment::with_prefix("JOBTRACK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?;

        cfg.try_deserialize().context("deserializing configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind, "127.0.0.1:8090");
        assert_eq!(settings.auth.session_idle_minutes, 30);
        assert_eq!(settings.auth.token_ttl_minutes, 60);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "0.0.0.0:9000"

[auth]
jwt_secret = "file-secret"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.auth.jwt_secret, "file-secret");
        // Untouched sections keep their defaults.
        assert_eq!(settings.auth.issuer, "jobtrack");
    }

    #[test]
    fn test_load_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.database.path, PathBuf::from("data/jobtrack.db"));
    }
}
