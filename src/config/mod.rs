pub mod types;

use std::path::Path;

use crate::domain::inventory::Domain;
use crate::error::{GatewayError, Result};
use types::Config;

pub const PROXY_URL_ENV: &str = "WC2030_PROXY_BASE_URL";

/// Environment variable carrying the API key for a domain's direct provider.
pub fn api_key_env(domain: Domain) -> String {
    format!("WC2030_{}_API_KEY", domain.as_str().to_ascii_uppercase())
}

/// Load configuration from YAML, then apply credential overrides from the environment.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        GatewayError::Configuration(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    let config: Config = serde_yml::from_str(&content)?;
    Ok(config)
}

/// Credentials are the only settings that may come from the environment.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    for domain in Domain::ALL {
        if let Some(key) = lookup(&api_key_env(domain)).filter(|k| !k.trim().is_empty()) {
            tracing::debug!(%domain, "API key taken from environment");
            config.providers.for_domain_mut(domain).api_key = Some(key);
        }
    }
    if let Some(url) = lookup(PROXY_URL_ENV).filter(|u| !u.trim().is_empty()) {
        tracing::debug!(url, "Proxy base URL taken from environment");
        config.providers.proxy_base_url = Some(url);
    }
}
