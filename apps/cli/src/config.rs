//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/gphotos/cli.toml`
//! - Windows: `%APPDATA%/gphotos/cli.toml`
//!
//! `GPHOTOS_ACCESS_TOKEN` overrides the stored access token.

use std::path::{Path, PathBuf};

use gphotos_client::auth::ACCESS_TOKEN_ENV;
use gphotos_protocol::UploadMethod;
use gphotos_protocol::constants::BASE_URL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upload endpoint; derived from `base_url` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,

    /// OAuth access token with a photo library scope.
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub upload_method: UploadMethod,

    /// Failed sends tolerated per chunk.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Files uploaded in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Listing page size; endpoint default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

fn default_base_url() -> String {
    BASE_URL.into()
}

fn default_retry_limit() -> u32 {
    10
}

fn default_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_url: None,
            access_token: String::new(),
            upload_method: UploadMethod::default(),
            retry_limit: default_retry_limit(),
            concurrency: default_concurrency(),
            page_size: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found,
    /// then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            config.apply_token_override(token);
        }
        Ok(config)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file may hold a token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn apply_token_override(&mut self, token: String) {
        if !token.trim().is_empty() {
            self.access_token = token;
        }
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let access_token = if self.access_token.is_empty() {
            String::new()
        } else {
            "<redacted>".into()
        };
        Self {
            access_token,
            ..self.clone()
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("gphotos")
            .join("cli.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("gphotos").join("cli.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/gphotos/cli.toml"))
    }
}
