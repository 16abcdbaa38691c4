mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./streamgate.toml",
        "~/.config/streamgate/config.toml",
        "/etc/streamgate/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.engine.binary.trim().is_empty() {
        anyhow::bail!("Engine binary cannot be empty");
    }

    if config.cache.handle_ttl_secs == 0 || config.cache.response_ttl_secs == 0 {
        anyhow::bail!("Cache TTLs must be non-zero");
    }

    if config.proxy.max_response_size == 0 {
        anyhow::bail!("Proxy max_response_size cannot be 0");
    }

    if config.proxy.range_window == 0 {
        anyhow::bail!("Proxy range_window cannot be 0");
    }

    if config.proxy.header_timeout_secs == 0 {
        anyhow::bail!("Proxy header_timeout_secs cannot be 0");
    }

    Ok(())
}
