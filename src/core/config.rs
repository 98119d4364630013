//! Credential resolution.
//!
//! The bearer token is resolved exactly once, when the provider config is
//! built, and then passed around explicitly. Business logic never reads the
//! process environment.

use std::path::{Path, PathBuf};

use crate::provider::constants::openai::{API_KEY_ENV_VAR, DEFAULT_SECRETS_FILE};

/// Where the API key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApiKey {
    /// Environment variable first, then the secrets file.
    #[default]
    Default,
    /// Like `Default`, but reading secrets from the given file.
    FromSecretsFile(PathBuf),
    Custom(String),
}

/// An opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(****)")
    }
}

impl ApiKey {
    /// Resolves the key. `None` is not an error here: a missing credential is
    /// reported on each request instead of failing startup.
    pub fn resolve(&self) -> Option<Credential> {
        match self {
            ApiKey::Custom(key) => Credential::new(key.as_str()),
            ApiKey::Default => resolve_with(
                |name| std::env::var(name).ok(),
                Path::new(DEFAULT_SECRETS_FILE),
            ),
            ApiKey::FromSecretsFile(path) => resolve_with(|name| std::env::var(name).ok(), path),
        }
    }
}

fn resolve_with<F>(env_lookup: F, secrets_file: &Path) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(credential) = env_lookup(API_KEY_ENV_VAR).and_then(Credential::new) {
        tracing::debug!(source = "environment", "Resolved API key");
        return Some(credential);
    }

    let credential = read_secret(secrets_file, API_KEY_ENV_VAR).and_then(Credential::new);
    if credential.is_some() {
        tracing::debug!(source = %secrets_file.display(), "Resolved API key");
    } else {
        tracing::debug!("No API key configured");
    }
    credential
}

/// Looks up `name` in a dotenv-format file without touching the process
/// environment.
fn read_secret(path: &Path, name: &str) -> Option<String> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "Secrets file not readable");
            return None;
        }
    };

    for entry in entries {
        match entry {
            Ok((key, value)) if key == name => return Some(value),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping malformed secrets line");
            }
        }
    }
    None
}
