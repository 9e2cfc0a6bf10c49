//! Credential resolution for the completion service.
//!
//! The API key is resolved exactly once at startup and handed to the
//! completion client as a `SecretString`; it is never mutated or logged
//! afterwards.

use secrecy::SecretString;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("missing credential: environment variable {0} is not set or empty")]
    MissingVar(String),
    #[error("no API key was entered")]
    EmptyInput,
    #[error("credential I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read API key from terminal: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Where the completion service credential comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read from the named environment variable.
    Environment { var: String },
    /// Read from `cache_path` if present, otherwise ask on the terminal and
    /// cache the answer there.
    Interactive { cache_path: PathBuf },
}

impl CredentialSource {
    /// Resolves the credential, reading from the process stdin/stderr when
    /// the interactive source needs to ask for it.
    pub fn resolve(&self) -> Result<SecretString, CredentialError> {
        match self {
            CredentialSource::Environment { var } => match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => {
                    info!(var = %var, "API key loaded from environment");
                    Ok(SecretString::from(value.trim().to_string()))
                }
                _ => Err(CredentialError::MissingVar(var.clone())),
            },
            CredentialSource::Interactive { cache_path } => {
                let stdin = std::io::stdin();
                resolve_interactive(cache_path, &mut stdin.lock(), &mut std::io::stderr())
            }
        }
    }
}

fn resolve_interactive(
    cache_path: &Path,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<SecretString, CredentialError> {
    let io_error = |source: std::io::Error| CredentialError::Io {
        path: cache_path.to_path_buf(),
        source,
    };

    match std::fs::read_to_string(cache_path) {
        Ok(cached) if !cached.trim().is_empty() => {
            info!(path = %cache_path.display(), "API key loaded from cache file");
            return Ok(SecretString::from(cached.trim().to_string()));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error(e)),
    }

    write!(output, "Enter API key: ").map_err(CredentialError::Prompt)?;
    output.flush().map_err(CredentialError::Prompt)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(CredentialError::Prompt)?;
    let key = line.trim().to_string();
    if key.is_empty() {
        return Err(CredentialError::EmptyInput);
    }

    std::fs::write(cache_path, &key).map_err(io_error)?;
    info!(path = %cache_path.display(), "API key cached");
    Ok(SecretString::from(key))
}
