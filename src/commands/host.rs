use anyhow::Result;
use depkit::Host;

use crate::Context;
use crate::runner::SystemExecutor;
use crate::ui;

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let host = Host::detect(&SystemExecutor::new(ctx.quiet));

    if json {
        println!("{}", serde_json::to_string_pretty(&host)?);
        return Ok(());
    }

    ui::header("Host");
    ui::kv("Platform", &host.description());
    ui::kv("System", &host.system);
    if let Some(flavour) = &host.flavour {
        ui::kv("Flavour", flavour);
    }
    ui::kv("Architecture", &host.arch);
    ui::kv("Choice order", &format!("{}, otherwise", host.match_list().join(", ")));
    Ok(())
}
