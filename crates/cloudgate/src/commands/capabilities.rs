use crate::gateway;
use cloudgate_config::GatewayConfig;
use colored::Colorize;

pub fn handle(config: &GatewayConfig, backend: Option<&str>) -> anyhow::Result<()> {
    let gateway = gateway::build(config, None)?;
    let registry = gateway.dispatcher.capabilities();

    let ids: Vec<&str> = match backend {
        Some(id) => vec![gateway::resolve_backend(config, Some(id))?],
        None => registry.backends(),
    };

    for id in ids {
        let name = registry
            .adapter(id)
            .map(|a| a.display_name().to_string())
            .unwrap_or_default();
        println!("{} {}", id.cyan().bold(), format!("({})", name).dimmed());
        for operation in registry.operations(id).iter() {
            println!("  {}", operation);
        }
        println!();
    }

    Ok(())
}
