use cloudgate_config::GatewayConfig;
use colored::Colorize;
use std::path::Path;

pub fn handle(config: &GatewayConfig, source: Option<&Path>) -> anyhow::Result<()> {
    match source {
        Some(path) => println!("{} {}", "設定ファイル:".blue(), path.display()),
        None => println!(
            "{}",
            "設定ファイルが見つからないためデフォルト設定を使用しています".dimmed()
        ),
    }
    println!();
    print!("{}", config.to_yaml()?);
    Ok(())
}
