//! Gateway configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.aladin/` by default) into
//! [`GatewayConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::{Path, PathBuf};

use aladin_types::config::GatewayConfig;
use aladin_types::llm::ProviderFamily;

pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// `ALADIN_DATA_DIR` wins, then `~/.aladin`, then `.aladin` in the current
/// directory.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ALADIN_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".aladin");
    }

    PathBuf::from(".aladin")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparseable file: a warning, then defaults.
/// - Unknown `provider_family`: a warning; the value is kept and resolves
///   to OpenAI through [`GatewayConfig::family`].
pub async fn load_gateway_config(data_dir: &Path) -> GatewayConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    let config = match toml::from_str::<GatewayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            return GatewayConfig::default();
        }
    };

    if config.provider_family.parse::<ProviderFamily>().is_err() {
        tracing::warn!(
            provider_family = %config.provider_family,
            "unknown provider family in config, falling back to openai"
        );
    }

    config
}
