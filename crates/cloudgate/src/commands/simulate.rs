use crate::gateway;
use cloudgate_config::GatewayConfig;
use cloudgate_core::{
    ActionDispatcher, ActionRequest, ActionResult, CreateRequest, ResourceKind,
};
use colored::Colorize;
use std::time::Duration;

/// 作成後に順番に実行するアクション
fn script(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::LoadBalancer => &["register", "unregister", "destroy"],
        _ => &["start", "stop", "destroy"],
    }
}

pub async fn handle(
    config: &GatewayConfig,
    backend: Option<&str>,
    kind: &str,
    interval_ms: u64,
) -> anyhow::Result<()> {
    let id = gateway::resolve_backend(config, backend)?;
    let kind: ResourceKind = kind.parse()?;
    let interval = Duration::from_millis(interval_ms.max(1));
    let gateway = gateway::build(config, Some(interval))?;
    let dispatcher = &gateway.dispatcher;

    println!(
        "{} {} on {}",
        "シミュレーション:".blue(),
        kind.to_string().cyan(),
        id.cyan()
    );

    let provisioning = dispatcher.create(CreateRequest::new(id, kind)).await;
    print_result("create", &provisioning.result)?;

    let (Some(resource_id), Some(convergence)) = (
        provisioning.result.resource_id.clone(),
        provisioning.convergence,
    ) else {
        anyhow::bail!("{} の作成に失敗しました", kind);
    };

    let outcome = convergence.await?;
    println!("{} {:?}", "収束:".blue(), outcome);
    if !outcome.is_converged() {
        anyhow::bail!("{} は収束しませんでした", resource_id);
    }

    for action in script(kind) {
        settle(dispatcher, id, kind, &resource_id, config.convergence.max_attempts, interval)
            .await?;
        let result = dispatcher
            .dispatch(ActionRequest::new(id, kind, &resource_id, *action))
            .await;
        print_result(action, &result)?;
    }

    if let Some(raw) = gateway
        .backend(id)
        .and_then(|b| b.raw_status(kind, &resource_id))
    {
        println!("{} {}", "最終ステータス (raw):".blue(), raw);
    }

    Ok(())
}

/// バックエンド側の自動遷移が落ち着くまで待つ
async fn settle(
    dispatcher: &ActionDispatcher,
    backend: &str,
    kind: ResourceKind,
    id: &str,
    max_attempts: u32,
    interval: Duration,
) -> anyhow::Result<()> {
    let Some(machine) = dispatcher.catalog().get(kind) else {
        return Ok(());
    };

    for _ in 0..max_attempts {
        match dispatcher.current_state(backend, kind, id).await? {
            Some(state) if !machine.is_settled(state) => {
                tracing::debug!("{} is {}, waiting", id, state);
                tokio::time::sleep(interval).await;
            }
            _ => return Ok(()),
        }
    }
    Ok(())
}

fn print_result(label: &str, result: &ActionResult) -> anyhow::Result<()> {
    let marker = if result.success {
        "✓".green()
    } else {
        "✗".red()
    };
    println!("{} {}", marker, label.bold());
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
