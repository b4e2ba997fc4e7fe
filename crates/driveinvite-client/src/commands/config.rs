//! Configuration commands.

use std::path::Path;

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &AppConfig, config_path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", config_path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &AppConfig) -> ClientResult<()> {
    check(config)?;
    println!("Configuration is valid.");
    Ok(())
}

fn check(config: &AppConfig) -> ClientResult<()> {
    if config.drive.parent_id.trim().is_empty() {
        return Err(ClientError::Config("[drive] parent_id must not be empty".to_string()));
    }
    if config.invite.calendar_id.trim().is_empty() {
        return Err(ClientError::Config(
            "[invite] calendar_id must not be empty".to_string(),
        ));
    }
    if config.google.timeout_secs == Some(0) {
        return Err(ClientError::Config(
            "[google] timeout_secs must be positive".to_string(),
        ));
    }

    if config.google.has_credentials() {
        let credentials = config.google.resolve_credentials().map_err(|e| {
            ClientError::Config(format!("invalid Google credentials: {}", e))
        })?;
        config
            .google
            .to_provider_config(credentials)
            .validate()
            .map_err(ClientError::Config)?;
    }
    Ok(())
}

/// Show the configuration file path.
pub fn path(config_path: &Path) -> ClientResult<()> {
    println!("config: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(check(&AppConfig::default()).is_ok());
    }

    #[test]
    fn empty_calendar_is_rejected() {
        let mut config = AppConfig::default();
        config.invite.calendar_id = String::new();
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("calendar_id"));
    }

    #[test]
    fn malformed_client_id_is_rejected() {
        let mut config = AppConfig::default();
        config.google.client_id = Some("not-a-google-client".to_string());
        config.google.client_secret = Some("secret".to_string());
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("apps.googleusercontent.com"));
    }

    #[test]
    fn empty_scope_list_falls_back_to_defaults() {
        let mut config = AppConfig::default();
        config.google.client_id = Some("id.apps.googleusercontent.com".to_string());
        config.google.client_secret = Some("secret".to_string());
        config.google.scopes = Vec::new();
        assert!(check(&config).is_ok());
    }
}
