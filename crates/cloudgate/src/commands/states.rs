use cloudgate_core::{LifecycleCatalog, ResourceKind, Trigger};
use colored::Colorize;

pub fn handle(kind: Option<&str>) -> anyhow::Result<()> {
    let catalog = LifecycleCatalog::standard()?;
    let kinds = match kind {
        Some(kind) => vec![kind.parse::<ResourceKind>()?],
        None => catalog.kinds(),
    };

    for kind in kinds {
        let Some(machine) = catalog.get(kind) else {
            anyhow::bail!("{} の状態遷移表は定義されていません", kind);
        };

        println!("{}", kind.to_string().cyan().bold());
        println!("  初期状態: {}", machine.initial_state().to_string().green());
        for transition in machine.transitions() {
            let trigger = match &transition.trigger {
                Trigger::Action(action) => action.yellow(),
                Trigger::Automatic => "(automatic)".dimmed(),
            };
            println!(
                "  {:<10} --{}--> {}",
                transition.from.to_string(),
                trigger,
                transition.to
            );
        }
        println!();
    }

    Ok(())
}
