//! Service-account credential resolution.
//!
//! Under an automation environment (CI) the key arrives as a base64 blob in
//! an environment variable and is written to the credential file before it
//! is loaded. Everywhere else the file is read as-is.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ns_core::{Config, Error, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a Google service-account JSON key this client needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Credentials(format!("Invalid service account key: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!(
                "Failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

/// Snapshot of the credential-related environment for one run.
#[derive(Clone)]
pub struct CredentialBootstrap {
    path: PathBuf,
    automation: bool,
    encoded: Option<String>,
}

impl fmt::Debug for CredentialBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBootstrap")
            .field("path", &self.path)
            .field("automation", &self.automation)
            .field("encoded", &self.encoded.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialBootstrap {
    pub fn new(path: impl Into<PathBuf>, automation: bool, encoded: Option<String>) -> Self {
        Self {
            path: path.into(),
            automation,
            encoded: encoded.filter(|e| !e.trim().is_empty()),
        }
    }

    /// Reads the automation flag and, only when it is set, the encoded key.
    pub fn from_env(config: &Config) -> Self {
        let automation = env::var(config.automation_env_var())
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        let encoded = if automation {
            env::var(config.credentials_env_var()).ok()
        } else {
            None
        };
        Self::new(config.credentials_path(), automation, encoded)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the decoded key to the credential path when running under
    /// automation with a blob available. Returns whether the file was
    /// written. Safe to call repeatedly.
    pub fn materialize(&self) -> Result<bool> {
        if !self.automation {
            return Ok(false);
        }
        let Some(encoded) = self.encoded.as_deref() else {
            warn!(
                "⚠️ Automation environment detected but no encoded credentials found; using {}",
                self.path.display()
            );
            return Ok(false);
        };

        let compact: String = encoded.split_whitespace().collect();
        let decoded = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::Credentials(format!("Invalid base64 credentials: {}", e)))?;
        let value: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|e| Error::Credentials(format!("Decoded credentials are not JSON: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Credentials(format!(
                    "Failed to create credentials directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        fs::write(&self.path, value.to_string()).map_err(|e| {
            Error::Credentials(format!(
                "Failed to write credentials file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        info!("🔑 Credentials written to {}", self.path.display());
        Ok(true)
    }

    /// Materializes (if applicable) and then loads the key from disk.
    pub fn load(&self) -> Result<ServiceAccountKey> {
        self.materialize()?;
        debug!("Loading service account key from {}", self.path.display());
        ServiceAccountKey::from_file(&self.path)
    }
}
