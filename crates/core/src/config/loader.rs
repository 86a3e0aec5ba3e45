use figment::{
    providers::{Env, Format, Toml},
    Figment, Provider,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix, e.g. `CROSSSEED_RUN__DELAY_SECS=5`
pub const ENV_PREFIX: &str = "CROSSSEED_";

/// Build the layered figment: optional TOML file, then environment overrides.
///
/// Callers can merge further providers (command-line flags) on top before
/// extracting with [`extract_config`].
pub fn config_figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Extract a [`Config`] from a figment.
pub fn extract_config(figment: &Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    extract_config(&config_figment(Some(path))?)
}

/// Load configuration from a file (optional) plus an extra override layer.
pub fn load_config_with(
    path: Option<&Path>,
    overrides: impl Provider,
) -> Result<Config, ConfigError> {
    extract_config(&config_figment(path)?.merge(overrides))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
