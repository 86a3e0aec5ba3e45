use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Input path exists (and is a directory when `parse_dir` is set)
/// - Save path is an existing directory
/// - Aggregator URL is an http(s) URL and the API key is set
/// - Tracker names are not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let run = &config.run;

    if !run.input_path.exists() {
        return Err(ConfigError::ValidationError(format!(
            "\"{}\" does not exist",
            run.input_path.display()
        )));
    }

    if run.parse_dir && !run.input_path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "\"{}\" is not a directory. parse_dir treats the entries inside the input path as individual releases",
            run.input_path.display()
        )));
    }

    if !run.save_path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "\"{}\" directory does not exist",
            run.save_path.display()
        )));
    }

    let url = &config.aggregator.url;
    if !url.starts_with("http") {
        return Err(ConfigError::ValidationError(
            "aggregator.url must start with http / https".to_string(),
        ));
    }
    reqwest::Url::parse(url).map_err(|e| {
        ConfigError::ValidationError(format!("aggregator.url \"{}\" is malformed: {}", url, e))
    })?;

    if config.aggregator.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "aggregator.api_key cannot be empty".to_string(),
        ));
    }

    if config.aggregator.trackers.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "aggregator.trackers contains an empty tracker name".to_string(),
        ));
    }

    if config.aggregator.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "aggregator.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
