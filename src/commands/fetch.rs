use anyhow::{Context as _, Result, bail};
use depkit::{PathProbe, ProcessExecutor, text};
use fetchkit::{ArchiveStrategy, GitStrategy, SourceDispatcher, SourceSpec};
use std::fs;
use std::rc::Rc;

use crate::Context;
use crate::cli::FetchArgs;
use crate::config::Config;
use crate::dep::CliDep;
use crate::runner::SystemExecutor;
use crate::ui;

pub fn run(ctx: &Context, args: FetchArgs) -> Result<()> {
    let config = Config::load()?;
    let download_dir = config.download_dir()?;
    let build_dir = config.build_dir()?;
    for dir in [&download_dir, &build_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
    }

    // Progress is shown by the fetch spinner, not per command
    let executor = SystemExecutor::new(true);
    let mut dispatcher = SourceDispatcher::standard(
        Rc::new(ArchiveStrategy::new(executor, &download_dir, &build_dir)),
        Rc::new(GitStrategy::new(executor, &build_dir)),
    );

    let dep = CliDep::new(&args.name, config.vars.clone());
    let specs: Vec<SourceSpec<'_>> = args.sources.iter().map(|s| SourceSpec::from(s.as_str())).collect();
    let tools = dispatcher.setup_source_uris(&dep, &specs)?;

    if !tools.is_empty() {
        ui::kv("Requires", &text::to_list(&tools));
        let missing = missing_tools(executor, &tools);
        if !missing.is_empty() {
            bail!(
                "{} {} needed to fetch {} but {} not installed",
                text::quoted_list(&missing),
                text::pluralize(missing.len(), "is", "are"),
                args.name,
                text::pluralize(missing.len(), "it's", "they're"),
            );
        }
    }

    if ctx.quiet || ctx.verbose > 0 {
        dispatcher.process_sources(&mut |line| log::debug!("{}", line))?;
    } else {
        let pb = ui::spinner(&format!("Fetching {}", args.name));
        let result = dispatcher.process_sources(&mut |line| pb.set_message(line.to_string()));
        pb.finish_and_clear();
        result?;
    }

    ui::success(&format!(
        "Fetched {} {} into {}",
        dispatcher.locators().len(),
        text::pluralize(dispatcher.locators().len(), "source", "sources"),
        build_dir.display()
    ));
    Ok(())
}

/// Tools that don't resolve on the PATH
fn missing_tools<E: ProcessExecutor>(executor: E, tools: &[String]) -> Vec<String> {
    let probe = PathProbe::new(executor);
    tools
        .iter()
        .filter(|tool| probe.which(tool).is_none())
        .cloned()
        .collect()
}
