//! 設定からディスパッチャを組み立てる

use anyhow::Context;
use cloudgate_config::GatewayConfig;
use cloudgate_core::{ActionDispatcher, ConvergenceConfig};
use cloudgate_drivers::{MockBackend, mock};
use std::sync::Arc;
use std::time::Duration;

pub struct Gateway {
    pub dispatcher: ActionDispatcher,
    pub backends: Vec<Arc<MockBackend>>,
}

impl Gateway {
    pub fn backend(&self, id: &str) -> Option<&Arc<MockBackend>> {
        self.backends.iter().find(|b| b.profile().id() == id)
    }
}

/// 設定された全バックエンドをインメモリで起動
///
/// `poll_interval` を渡すと設定値より優先される
pub fn build(config: &GatewayConfig, poll_interval: Option<Duration>) -> anyhow::Result<Gateway> {
    let mut profiles = Vec::with_capacity(config.backends.len());
    for entry in &config.backends {
        let mut profile = cloudgate_drivers::profile(&entry.profile)
            .with_context(|| format!("バックエンド '{}' の初期化に失敗しました", entry.id))?
            .with_id(&entry.id);
        if let Some(name) = &entry.display_name {
            profile = profile.with_display_name(name);
        }
        profiles.push(profile);
    }

    let (builder, backends) = mock::mount(ActionDispatcher::builder(), profiles)?;
    let convergence = ConvergenceConfig::new(
        config.convergence.max_attempts,
        poll_interval.unwrap_or_else(|| config.poll_interval()),
    );
    let dispatcher = builder
        .backend_timeout(config.backend_timeout())
        .convergence(convergence)
        .build()?;

    Ok(Gateway {
        dispatcher,
        backends,
    })
}

/// 指定がなければ default_backend を使う
pub fn resolve_backend<'a>(
    config: &'a GatewayConfig,
    backend: Option<&'a str>,
) -> anyhow::Result<&'a str> {
    let id = backend
        .or_else(|| config.default_backend_id())
        .context("バックエンドが設定されていません")?;
    if config.backend(id).is_none() {
        anyhow::bail!("バックエンド '{}' は設定されていません", id);
    }
    Ok(id)
}
