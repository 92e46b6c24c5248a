use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Identity of the GitHub App and where its API lives.
#[derive(Debug, Clone)]
pub struct GitHubAppConfig {
    pub app_id: u64,
    pub private_key_pem_path: PathBuf,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub github: GitHubAppConfig,
    pub listen_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_app_id = lookup("APP_ID").ok_or(ConfigError::MissingVar("APP_ID"))?;
        let app_id = raw_app_id
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAppId {
                value: raw_app_id.clone(),
                source,
            })?;
        let private_key_pem_path =
            lookup("PRIVATE_KEY_PATH").ok_or(ConfigError::MissingVar("PRIVATE_KEY_PATH"))?;

        let api_base_url = lookup("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        Ok(AppConfig {
            github: GitHubAppConfig {
                app_id,
                private_key_pem_path: PathBuf::from(private_key_pem_path),
                api_base_url,
            },
            listen_addr,
        })
    }
}
