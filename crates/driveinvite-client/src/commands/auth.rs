//! Authentication command.

use std::path::{Path, PathBuf};

use driveinvite_providers::google::{GoogleSession, OAuthCredentials};
use tracing::{info, warn};

use crate::config::{AppConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Where the credentials were resolved from.
#[derive(Debug, PartialEq)]
enum CredentialSource {
    /// `--client-id` and `--client-secret`.
    Inline,
    /// `--credentials-file`.
    File(PathBuf),
    /// `config.toml`, already persisted.
    Config,
}

/// Runs the OAuth consent flow for Drive, Calendar and Gmail.
///
/// Credentials given on the command line are written to `config_path` so
/// later `sync` and `send` runs find them.
pub async fn run(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &AppConfig,
    config_path: &Path,
) -> ClientResult<()> {
    let (credentials, source) =
        resolve_credentials(client_id, client_secret, credentials_file, &config.google)?;
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    let session = GoogleSession::new(config.google.to_provider_config(credentials.clone()))?;

    if session.is_authenticated() && !session.needs_reauth() && !force {
        persist(config_path, &credentials, &source);
        println!("Already authenticated with Google.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    }

    println!("Starting Google authentication...");
    println!();
    println!("A browser window will open for you to authorize access to");
    println!("Drive, Calendar and Gmail.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    session.authenticate().await?;
    persist(config_path, &credentials, &source);

    info!("Google authentication successful");
    println!();
    println!("Authentication successful!");
    println!(
        "Tokens saved to {}.",
        session.config().token_path.display()
    );
    Ok(())
}

/// Resolves credentials.
///
/// Priority (highest to lowest):
/// 1. `--client-id` + `--client-secret`
/// 2. `--credentials-file`
/// 3. `config.toml` `[google]` section
fn resolve_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    settings: &GoogleSettings,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    match (cli_client_id, cli_client_secret) {
        (Some(id), Some(secret)) => {
            return Ok((OAuthCredentials::new(id, secret), CredentialSource::Inline));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ClientError::Config(
                "both --client-id and --client-secret are required when providing credentials directly"
                    .to_string(),
            ));
        }
        (None, None) => {}
    }

    if let Some(path) = cli_credentials_file {
        let credentials = OAuthCredentials::from_file(&path)?;
        return Ok((credentials, CredentialSource::File(path)));
    }

    if settings.has_credentials() {
        let credentials = settings.resolve_credentials().map_err(|e| {
            ClientError::Config(format!(
                "failed to resolve Google credentials from config: {}",
                e
            ))
        })?;
        return Ok((credentials, CredentialSource::Config));
    }

    Err(ClientError::Config(format!(
        "Google credentials are required. Provide via:\n  \
         - credentials_file or client_id + client_secret in {}\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - --client-id and --client-secret flags\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        AppConfig::default_path().display()
    )))
}

/// Saves command-line credentials; failures only warn.
fn persist(config_path: &Path, credentials: &OAuthCredentials, source: &CredentialSource) {
    match save_credentials(config_path, credentials, source) {
        Ok(true) => println!("Credentials saved to {}", config_path.display()),
        Ok(false) => {}
        Err(e) => warn!(path = %config_path.display(), error = %e, "could not save credentials"),
    }
}

/// Writes credentials under `[google]`, keeping the rest of the file intact.
///
/// Returns false when the credentials already came from the file.
fn save_credentials(
    config_path: &Path,
    credentials: &OAuthCredentials,
    source: &CredentialSource,
) -> Result<bool, String> {
    if *source == CredentialSource::Config {
        return Ok(false);
    }

    let content = if config_path.exists() {
        std::fs::read_to_string(config_path).map_err(|e| e.to_string())?
    } else {
        String::new()
    };
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| format!("could not parse {}: {}", config_path.display(), e))?;

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let google = doc["google"]
        .as_table_mut()
        .ok_or_else(|| "[google] is not a table".to_string())?;

    match source {
        CredentialSource::File(path) => {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            google["credentials_file"] = toml_edit::value(absolute.display().to_string());
            google.remove("client_id");
            google.remove("client_secret");
        }
        _ => {
            google["client_id"] = toml_edit::value(credentials.client_id.as_str());
            google["client_secret"] = toml_edit::value(credentials.client_secret.as_str());
            google.remove("credentials_file");
        }
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(config_path, doc.to_string()).map_err(|e| e.to_string())?;
    Ok(true)
}
