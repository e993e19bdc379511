//! ゲートウェイ設定 (cloudgate.yaml)
//!
//! ```yaml
//! default_backend: paci-eu
//! dispatch:
//!   backend_timeout_ms: 30000
//! convergence:
//!   max_attempts: 30
//!   poll_interval_ms: 10000
//! backends:
//!   - id: paci-eu
//!     profile: paci
//!   - id: vcloud
//!     profile: vcloud
//!     display_name: vCloud Director
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// バックエンド未指定時に使うバックエンドID
    pub default_backend: Option<String>,

    pub dispatch: DispatchSettings,

    pub convergence: ConvergenceSettings,

    pub backends: Vec<BackendEntry>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_backend: None,
            dispatch: DispatchSettings::default(),
            convergence: ConvergenceSettings::default(),
            backends: vec![BackendEntry::new("mock", "mock")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// バックエンド呼び出し1回あたりのタイムアウト
    pub backend_timeout_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            backend_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceSettings {
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for ConvergenceSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEntry {
    pub id: String,

    /// 組み込みプロファイル名 (paci, vcloud, mock)
    pub profile: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl BackendEntry {
    pub fn new(id: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: profile.into(),
            display_name: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.backend_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.convergence.poll_interval_ms)
    }

    pub fn backend(&self, id: &str) -> Option<&BackendEntry> {
        self.backends.iter().find(|b| b.id == id)
    }

    /// default_backend、なければ最初のバックエンド
    pub fn default_backend_id(&self) -> Option<&str> {
        self.default_backend
            .as_deref()
            .or_else(|| self.backends.first().map(|b| b.id.as_str()))
    }

    /// 設定値の検証
    ///
    /// `known_profiles` はドライバが提供するプロファイル名の一覧
    pub fn validate(&self, known_profiles: &[&str]) -> Result<()> {
        if self.dispatch.backend_timeout_ms == 0 {
            return Err(invalid("dispatch.backend_timeout_ms は 1 以上にしてください"));
        }
        if self.convergence.max_attempts == 0 {
            return Err(invalid("convergence.max_attempts は 1 以上にしてください"));
        }
        if self.convergence.poll_interval_ms == 0 {
            return Err(invalid("convergence.poll_interval_ms は 1 以上にしてください"));
        }
        if self.backends.is_empty() {
            return Err(invalid("backends が空です"));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if backend.id.trim().is_empty() {
                return Err(invalid("バックエンドIDが空です"));
            }
            if !seen.insert(backend.id.as_str()) {
                return Err(invalid(format!("バックエンドID '{}' が重複しています", backend.id)));
            }
            if !known_profiles.contains(&backend.profile.as_str()) {
                return Err(invalid(format!(
                    "バックエンド '{}' のプロファイル '{}' は不明です (利用可能: {})",
                    backend.id,
                    backend.profile,
                    known_profiles.join(", ")
                )));
            }
        }

        if let Some(default) = &self.default_backend {
            if self.backend(default).is_none() {
                return Err(invalid(format!(
                    "default_backend '{}' は backends に定義されていません",
                    default
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
