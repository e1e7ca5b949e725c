//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every problem is reported, not
//! just the first.

use crate::config::schema::{AppConfig, NetworkConfig};

/// A single semantic problem in a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate the application config.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than 0"));
    }
    if config.rpc.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.rpc.poll_interval_ms == 0 {
        errors.push(ValidationError::new("rpc.poll_interval_ms", "must be greater than 0"));
    }
    if config.rpc.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new(
            "rpc.max_gas_price_gwei",
            "must be greater than 0",
        ));
    }
    if config.networks.default.trim().is_empty() {
        errors.push(ValidationError::new("networks.default", "must not be empty"));
    }
    if config.wallet.dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("wallet.dir", "must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "logging.level",
            format!("unknown level '{}'", config.logging.level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one network entry.
pub fn validate_network(network: &NetworkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let field = |name: &str| format!("networks.{}.{}", network.key, name);

    if network.key.trim().is_empty() {
        errors.push(ValidationError::new("networks", "network key must not be empty"));
    }
    if network.name.trim().is_empty() {
        errors.push(ValidationError::new(field("name"), "must not be empty"));
    }
    if network.symbol.trim().is_empty() {
        errors.push(ValidationError::new(field("symbol"), "must not be empty"));
    }
    if network.chain_id == 0 {
        errors.push(ValidationError::new(field("chain_id"), "must be greater than 0"));
    }
    if network.decimals > 77 {
        errors.push(ValidationError::new(field("decimals"), "must be at most 77"));
    }
    for (i, url) in network.endpoints().enumerate() {
        let name = if i == 0 {
            field("rpc_url")
        } else {
            field(&format!("fallback_rpc_urls[{}]", i - 1))
        };
        match url.parse::<url::Url>() {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => errors.push(ValidationError::new(
                name,
                format!("unsupported scheme '{}'", parsed.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(name, format!("invalid URL: {}", e))),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
