use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(_ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
    }
}

fn show() -> Result<()> {
    ui::header("Configuration");

    let file = paths::config_file()?;
    ui::kv("Config file", &file.display().to_string());
    if !file.exists() {
        ui::dim("Not found, using defaults");
    }
    ui::kv("Cache directory", &paths::cache_dir()?.display().to_string());

    let config = Config::load()?;
    ui::kv("Downloads", &config.download_dir()?.display().to_string());
    ui::kv("Builds", &config.build_dir()?.display().to_string());

    println!();
    print!("{}", toml::to_string_pretty(&config)?);

    println!();
    ui::dim(&format!("Set {} to use another config directory.", paths::ENV_CONFIG_DIR));
    Ok(())
}
