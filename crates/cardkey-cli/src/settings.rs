//! 命令行配置
//!
//! Loaded from a TOML file; every section and field has a default so a
//! missing file or a partial file both work.

use std::{fs, path::{Path, PathBuf}};

use cardkey_pki::AuthorityConfig;
use cardkey_token::{OperationOptions, DEFAULT_LAUNCH_URL};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub provider: ProviderSettings,
    pub operations: OperationSettings,
    pub auth: AuthSettings,
    pub depot: DepotSettings,
    pub authority: AuthorityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 令牌提供方
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Bundle id used for the token id of the software token
    pub provider_id: String,
    /// When set, only tokens from these providers are queried
    pub allowed_provider_ids: Option<Vec<String>>,
    pub launch_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: "com.vmware.pivd".to_string(),
            allowed_provider_ids: None,
            launch_url: DEFAULT_LAUNCH_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSettings {
    #[serde(flatten)]
    pub algorithms: OperationOptions,
    /// Refuse sign and encrypt without an explicit selection
    pub require_selection: bool,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            algorithms: OperationOptions::default(),
            require_selection: true,
        }
    }
}

/// 客户端证书认证
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub url: String,
    /// Handed to the HTTP transport
    pub timeout_secs: u64,
    pub max_previous_failures: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            url: "https://example.com/".to_string(),
            timeout_secs: 30,
            max_previous_failures: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotSettings {
    pub path: PathBuf,
}

impl Default for DepotSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("depot"),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> CliResult<Self> {
        toml::from_str(text).map_err(|e| CliError::Config(e.to_string()))
    }
}
