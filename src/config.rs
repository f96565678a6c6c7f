use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::database::{Credentials, SurrealConfig};
use crate::error::ConfigSnafu;
use crate::prelude::*;
use crate::InitError;

/// Service configuration, read from environment variables (`HOST_ADDRESS`, `SURREAL_URL`, ...).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,

    #[serde(default = "default_surreal_url")]
    pub surreal_url: Url,
    #[serde(rename = "surreal_ns", default = "default_surreal_name")]
    pub surreal_namespace: String,
    #[serde(rename = "surreal_db", default = "default_surreal_name")]
    pub surreal_database: String,
    #[serde(rename = "surreal_user", default)]
    pub surreal_username: Option<String>,
    #[serde(rename = "surreal_pass", default)]
    pub surreal_password: Option<String>,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Largest accepted request body in bytes.
    #[serde(default = "default_upload_limit")]
    pub upload_limit: usize,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_surreal_url() -> Url {
    SurrealConfig::in_memory().url
}

fn default_surreal_name() -> String {
    "watch_progress".to_owned()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_upload_limit() -> usize {
    512 * 1024 * 1024
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    pub fn from_env() -> Result<Config, InitError> {
        envy::from_env::<Config>().context(ConfigSnafu)
    }

    pub fn surreal(&self) -> SurrealConfig {
        let credentials = match (&self.surreal_username, &self.surreal_password) {
            (Some(username), Some(password)) => Some(Credentials::new(username.clone(), password.clone())),
            _ => None,
        };

        SurrealConfig::new(
            self.surreal_url.clone(),
            self.surreal_namespace.clone(),
            self.surreal_database.clone(),
            credentials,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn everything_has_a_default() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.host, default_host());
        assert_eq!(config.surreal_url.as_str(), "mem://");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.surreal().credentials, None);
    }

    #[test]
    fn reads_upper_case_variables() {
        let config: Config = envy::from_iter(vars(&[
            ("HOST_ADDRESS", "127.0.0.1:8080"),
            ("SURREAL_URL", "ws://localhost:8000"),
            ("SURREAL_NS", "media"),
            ("SURREAL_USER", "root"),
            ("SURREAL_PASS", "secret"),
            ("UPLOAD_LIMIT", "1048576"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.upload_limit, 1_048_576);

        let surreal = config.surreal();
        assert_eq!(surreal.url.as_str(), "ws://localhost:8000/");
        assert_eq!(surreal.namespace, "media");
        assert_eq!(surreal.database, "watch_progress");
        assert_eq!(
            surreal.credentials,
            Some(Credentials::new("root".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn credentials_need_both_halves() {
        let config: Config = envy::from_iter(vars(&[("SURREAL_USER", "root")])).unwrap();
        assert_eq!(config.surreal().credentials, None);
    }
}
