mod cli;
mod commands;
mod config;
mod dep;
mod paths;
mod runner;
mod sudo;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Every operation reports one line at info, so that's the floor
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Check(args) => commands::check::run(&ctx, args),
        Command::Patch(args) => commands::patch::run(&ctx, args),
        Command::Fetch(args) => commands::fetch::run(&ctx, args),
        Command::Choose(args) => commands::choose::run(&ctx, args),
        Command::Host { json } => commands::host::run(&ctx, json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "provision", &mut io::stdout());
            Ok(())
        }
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
    }
}
