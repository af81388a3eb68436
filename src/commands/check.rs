use anyhow::{Result, bail};
use depkit::{CommandLocation, CommandLocationVerifier, InstallSource, ProcessExecutor, verify};

use crate::Context;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::runner::SystemExecutor;

pub fn run(ctx: &Context, args: CheckArgs) -> Result<()> {
    let config = Config::load()?;
    let source = config.install_source();
    let executor = SystemExecutor::new(ctx.quiet);

    let location = check(&executor, &source, &args);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&location)?);
    }

    match location {
        CommandLocation::InPath { .. } => Ok(()),
        CommandLocation::Missing { missing } => {
            bail!("{} not met: {} missing", dep_name(&args), depkit::text::quoted_list(&missing))
        }
        CommandLocation::Conflicting { .. } => bail!(
            "{} is installed from more than one place; remove the other copy or pass --dir",
            dep_name(&args)
        ),
    }
}

fn dep_name(args: &CheckArgs) -> &str {
    args.name
        .as_deref()
        .or_else(|| args.commands.first().map(String::as_str))
        .unwrap_or("check")
}

/// Classify the commands, logging the outcome unless JSON was asked for
fn check<E: ProcessExecutor>(executor: E, source: &dyn InstallSource, args: &CheckArgs) -> CommandLocation {
    let commands: Vec<&str> = args.commands.iter().map(String::as_str).collect();
    let verifier = CommandLocationVerifier::new(executor, source);
    let location = verifier.classify(&commands, args.dir.as_deref());
    if !args.json {
        verify::report(dep_name(args), &location);
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::WhichTable;
    use depkit::PrefixInstallSource;
    use std::path::PathBuf;

    fn args(commands: &[&str], dir: Option<&str>) -> CheckArgs {
        CheckArgs {
            commands: commands.iter().map(|c| (*c).to_string()).collect(),
            dir: dir.map(PathBuf::from),
            name: None,
            json: true,
        }
    }

    fn local() -> PrefixInstallSource {
        PrefixInstallSource::new("local", vec![PathBuf::from("/usr/local/bin")])
    }

    #[test]
    fn test_conflict_between_ours_and_system() {
        let exec = WhichTable::new(&[("a", "/usr/bin/a"), ("b", "/usr/bin/b"), ("c", "/usr/local/bin/c")]);
        let location = check(&exec, &local(), &args(&["a", "b", "c"], None));
        assert!(location.is_conflicting());
    }

    #[test]
    fn test_custom_dir_decides_ours() {
        let exec = WhichTable::new(&[("psql", "/opt/pg/bin/psql"), ("pg_dump", "/opt/pg/bin/pg_dump")]);
        let location = check(&exec, &local(), &args(&["psql", "pg_dump"], Some("/opt/pg/bin")));
        match location {
            CommandLocation::InPath { ours, location } => {
                assert!(ours);
                assert_eq!(location.dir, PathBuf::from("/opt/pg/bin"));
            }
            other => panic!("expected InPath, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_command() {
        let exec = WhichTable::new(&[("git", "/usr/bin/git")]);
        let location = check(&exec, &local(), &args(&["git", "gitk"], None));
        assert_eq!(
            location,
            CommandLocation::Missing {
                missing: vec!["gitk".to_string()]
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let exec = WhichTable::new(&[]);
        let location = check(&exec, &local(), &args(&["nope"], None));
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["status"], "missing");
        assert_eq!(json["missing"][0], "nope");
    }

    #[test]
    fn test_dep_name_defaults_to_first_command() {
        let mut a = args(&["psql", "pg_dump"], None);
        assert_eq!(dep_name(&a), "psql");
        a.name = Some("postgres".to_string());
        assert_eq!(dep_name(&a), "postgres");
    }
}
