use crate::gateway;
use cloudgate_config::GatewayConfig;
use colored::Colorize;

pub fn handle(config: &GatewayConfig, backend: Option<&str>, raw: &str) -> anyhow::Result<()> {
    let id = gateway::resolve_backend(config, backend)?;
    let gateway = gateway::build(config, None)?;
    let normalizer = gateway.dispatcher.normalizer();

    let state = gateway.dispatcher.normalize(id, raw);
    let known = normalizer
        .table(id)
        .is_some_and(|table| table.lookup(raw).is_some());

    if known {
        println!("{} -> {}", raw, state.to_string().green().bold());
    } else {
        println!(
            "{} -> {} {}",
            raw,
            state.to_string().yellow().bold(),
            "(未知のステータス: フォールバック)".dimmed()
        );
    }

    Ok(())
}
