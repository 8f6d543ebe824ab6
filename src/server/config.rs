use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_identity_provider_url")]
    pub identity_provider_url: String,

    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,

    #[serde(default = "default_probe_max_redirects")]
    pub probe_max_redirects: usize,

    #[serde(default = "default_monitor_concurrency")]
    pub monitor_concurrency: usize,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub(crate) struct PartialServerConfig {
    database_url: Option<String>,
    bind_address: Option<String>,
    identity_provider_url: Option<String>,
    session_ttl_days: Option<i64>,
    probe_timeout_seconds: Option<u64>,
    probe_max_redirects: Option<usize>,
    monitor_concurrency: Option<usize>,
    log_dir: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_identity_provider_url() -> String {
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data".to_string()
}

fn default_session_ttl_days() -> i64 {
    7
}

fn default_probe_timeout_seconds() -> u64 {
    10
}

fn default_probe_max_redirects() -> usize {
    10
}

fn default_monitor_concurrency() -> usize {
    8
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => read_file_layer(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::from_layers(env_config, file_config)
    }

    pub(crate) fn from_layers(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, String> {
        let config = ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            bind_address: env_config
                .bind_address
                .or(file_config.bind_address)
                .unwrap_or_else(default_bind_address),
            identity_provider_url: env_config
                .identity_provider_url
                .or(file_config.identity_provider_url)
                .unwrap_or_else(default_identity_provider_url),
            session_ttl_days: env_config
                .session_ttl_days
                .or(file_config.session_ttl_days)
                .unwrap_or_else(default_session_ttl_days),
            probe_timeout_seconds: env_config
                .probe_timeout_seconds
                .or(file_config.probe_timeout_seconds)
                .unwrap_or_else(default_probe_timeout_seconds),
            probe_max_redirects: env_config
                .probe_max_redirects
                .or(file_config.probe_max_redirects)
                .unwrap_or_else(default_probe_max_redirects),
            monitor_concurrency: env_config
                .monitor_concurrency
                .or(file_config.monitor_concurrency)
                .unwrap_or_else(default_monitor_concurrency),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.session_ttl_days < 1 {
            return Err("SESSION_TTL_DAYS must be at least 1".to_string());
        }
        if self.probe_timeout_seconds < 1 {
            return Err("PROBE_TIMEOUT_SECONDS must be at least 1".to_string());
        }
        if self.monitor_concurrency < 1 {
            return Err("MONITOR_CONCURRENCY must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

fn read_file_layer(path: &Path) -> Result<PartialServerConfig, String> {
    if !path.exists() {
        return Ok(PartialServerConfig::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
    toml::from_str(&contents)
        .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_layer(contents: &str) -> PartialServerConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        read_file_layer(file.path()).unwrap()
    }

    #[test]
    fn defaults_fill_everything_but_the_database() {
        let file = file_layer(r#"database_url = "postgres://localhost/tracker""#);
        let config = ServerConfig::from_layers(PartialServerConfig::default(), file).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/tracker");
        assert_eq!(config.bind_address, "0.0.0.0:8001");
        assert_eq!(config.probe_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe_max_redirects, 10);
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
        assert_eq!(config.monitor_concurrency, 8);
    }

    #[test]
    fn environment_overrides_file() {
        let file = file_layer(
            r#"
            database_url = "postgres://file/db"
            probe_timeout_seconds = 3
            monitor_concurrency = 2
            "#,
        );
        let env = PartialServerConfig {
            database_url: Some("postgres://env/db".into()),
            monitor_concurrency: Some(16),
            ..Default::default()
        };
        let config = ServerConfig::from_layers(env, file).unwrap();

        assert_eq!(config.database_url, "postgres://env/db");
        assert_eq!(config.probe_timeout_seconds, 3);
        assert_eq!(config.monitor_concurrency, 16);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = ServerConfig::from_layers(
            PartialServerConfig::default(),
            PartialServerConfig::default(),
        )
        .unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let env = PartialServerConfig {
            database_url: Some("postgres://env/db".into()),
            probe_timeout_seconds: Some(0),
            ..Default::default()
        };
        let err = ServerConfig::from_layers(env, PartialServerConfig::default()).unwrap_err();
        assert!(err.contains("PROBE_TIMEOUT_SECONDS"));
    }

    #[test]
    fn absent_config_file_is_not_an_error() {
        let layer = read_file_layer(Path::new("/definitely/not/here.toml")).unwrap();
        assert!(layer.database_url.is_none());
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"probe_timeout_seconds = \"ten\"").unwrap();
        let err = read_file_layer(file.path()).unwrap_err();
        assert!(err.contains("Failed to parse TOML"));
    }
}
