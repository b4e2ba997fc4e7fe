//! Secret references in configuration values.
//!
//! `client_id` and `client_secret` in `config.toml` may point at a secret
//! kept outside the file:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//! - anything else: used verbatim

use std::process::Command;

use thiserror::Error;

/// Failure to expand a secret reference.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("environment variable `{0}` is not set")]
    MissingEnv(String),

    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("`pass show {0}` produced no output")]
    PassEmpty(String),
}

/// A parsed configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Pass(&'a str),
    Env(&'a str),
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Expands the reference into the secret value.
    pub fn resolve(self) -> Result<String, SecretError> {
        match self {
            Self::Pass(path) => read_pass(path),
            Self::Env(var) => {
                std::env::var(var).map_err(|_| SecretError::MissingEnv(var.to_string()))
            }
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Parses and expands `value`.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    SecretRef::parse(value).resolve()
}

fn read_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixes() {
        assert_eq!(SecretRef::parse("pass::google/id"), SecretRef::Pass("google/id"));
        assert_eq!(SecretRef::parse("env::GOOGLE_ID"), SecretRef::Env("GOOGLE_ID"));
        assert_eq!(
            SecretRef::parse("xxx.apps.googleusercontent.com"),
            SecretRef::Plain("xxx.apps.googleusercontent.com")
        );
        // Only a leading prefix counts
        assert_eq!(SecretRef::parse("a env::B"), SecretRef::Plain("a env::B"));
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hello").unwrap(), "hello");
        assert_eq!(resolve("").unwrap(), "");
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_DRIVEINVITE_TEST_SECRET", "my-secret-value");
        }
        assert_eq!(
            resolve("env::_DRIVEINVITE_TEST_SECRET").unwrap(),
            "my-secret-value"
        );
        unsafe {
            std::env::remove_var("_DRIVEINVITE_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_DRIVEINVITE_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(matches!(err, SecretError::MissingEnv(_)));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        // Fails whether or not `pass` is installed
        assert!(resolve("pass::nonexistent/driveinvite/entry/12345").is_err());
    }
}
