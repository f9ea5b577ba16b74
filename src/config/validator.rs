//! Configuration validation

use super::*;
use anyhow::Result;
use tracing::warn;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(&config.server)?;
    validate_dictionary(&config.dictionary)?;
    validate_limits(&config.limits)?;
    validate_output(&config.output)?;

    Ok(())
}

/// Validate listener settings
pub fn validate_server(server: &ServerConfig) -> Result<()> {
    if server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if server.port == 0 {
        anyhow::bail!("server.port must be between 1 and 65535");
    }

    if server.read_timeout().is_none() {
        warn!("Client read timeout disabled; an idle client holds the server indefinitely");
    }

    Ok(())
}

/// Validate dictionary settings
pub fn validate_dictionary(dictionary: &DictionaryConfig) -> Result<()> {
    if dictionary.path.as_os_str().is_empty() {
        anyhow::bail!("dictionary.path must not be empty");
    }

    Ok(())
}

/// Validate request limits
pub fn validate_limits(limits: &LimitsConfig) -> Result<()> {
    if limits.input_chars == 0 {
        anyhow::bail!("limits.input_chars must be at least 1");
    }

    if limits.output_chars == 0 {
        anyhow::bail!("limits.output_chars must be at least 1");
    }

    if limits.top_k == 0 {
        anyhow::bail!("limits.top_k must be at least 1");
    }

    if limits.output_chars < limits.input_chars {
        anyhow::bail!(
            "limits.output_chars ({}) must not be smaller than limits.input_chars ({})",
            limits.output_chars,
            limits.input_chars
        );
    }

    Ok(())
}

/// Validate output settings
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if let Some(ref path) = output.summary_json {
        if path.as_os_str().is_empty() {
            anyhow::bail!("output.summary_json must not be empty");
        }
        if path.is_dir() {
            anyhow::bail!("output.summary_json is a directory: {}", path.display());
        }
    }

    Ok(())
}
