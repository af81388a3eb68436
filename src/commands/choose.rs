use anyhow::{Result, bail};
use depkit::{ChoiceScope, ChoiceSet, ChoiceValue, Chosen, Host};

use crate::Context;
use crate::cli::ChooseArgs;
use crate::config::Config;
use crate::dep::{CliDep, parse_pairs};
use crate::runner::SystemExecutor;

/// Choice names allowed when `--choices` isn't given
const DEFAULT_CHOICES: &[&str] = &[
    "osx", "linux", "windows", "freebsd", "ubuntu", "debian", "fedora", "centos", "rhel", "arch", "alpine",
];

/// Behavior for one or more choices, from `--option names=values`
#[derive(Debug, Clone, PartialEq, Eq)]
struct OptionSpec {
    names: Vec<String>,
    values: Vec<String>,
}

impl OptionSpec {
    fn parse(raw: &str) -> Result<Self> {
        let Some((names, values)) = raw.split_once('=') else {
            bail!("Expected name=value for --option, got '{}'", raw);
        };
        let names: Vec<String> = split_list(names);
        if names.is_empty() {
            bail!("No choice name in --option '{}'", raw);
        }
        Ok(Self {
            names,
            values: split_list(values),
        })
    }

    /// Values that mention `{var}` are filled in only if their choice wins
    fn is_templated(&self) -> bool {
        self.values.iter().any(|v| v.contains('{'))
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn run(ctx: &Context, args: ChooseArgs) -> Result<()> {
    let config = Config::load()?;
    let mut vars = config.vars.clone();
    vars.extend(parse_pairs(&args.vars)?);

    let host = Host::detect(&SystemExecutor::new(ctx.quiet));
    let candidates = if args.platform.is_empty() {
        host.match_list()
    } else {
        args.platform.clone()
    };
    let options = args
        .options
        .iter()
        .map(|o| OptionSpec::parse(o))
        .collect::<Result<Vec<_>>>()?;

    let dep = CliDep::new(&args.name, vars);
    let choices = allowed_choices(&args.choices, &candidates);
    let choices: Vec<&str> = choices.iter().map(String::as_str).collect();

    let chosen = decide(
        &dep,
        &host,
        &choices,
        &candidates,
        &options,
        args.otherwise.as_deref(),
        args.unsupported,
    )?;

    let name = chosen.name().map(String::from);
    match chosen {
        Chosen::NoMatch => bail!(
            "Nothing chosen for {} on {} (tried {})",
            args.name,
            host.description(),
            candidates.join(", ")
        ),
        other => match other.into_value() {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => match dep.unmeetable() {
                Some(reason) => bail!("{}", reason),
                None => bail!(
                    "'{}' was chosen for {} but gave no value",
                    name.unwrap_or_default(),
                    args.name
                ),
            },
        },
    }
}

/// The closed set of choice names
fn allowed_choices(explicit: &[String], candidates: &[String]) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let mut choices: Vec<String> = DEFAULT_CHOICES.iter().map(|c| (*c).to_string()).collect();
    for candidate in candidates {
        if !choices.contains(candidate) && candidate != depkit::OTHERWISE {
            choices.push(candidate.clone());
        }
    }
    choices
}

fn decide(
    dep: &CliDep,
    host: &Host,
    choices: &[&str],
    candidates: &[String],
    options: &[OptionSpec],
    otherwise: Option<&str>,
    unsupported: bool,
) -> Result<Chosen> {
    let chosen = ChoiceSet::new(dep, choices)?
        .with_host(host)
        .select(candidates, |set| {
            for option in options {
                if option.is_templated() {
                    let values = option.values.clone();
                    set.on_deferred(option.names.clone(), move |scope| {
                        Some(ChoiceValue::from(
                            values.iter().map(|v| interpolate(v, scope)).collect::<Vec<String>>(),
                        ))
                    })?;
                } else {
                    set.on(option.names.clone(), option.values.clone())?;
                }
            }

            if let Some(value) = otherwise {
                set.otherwise(value)?;
            } else if unsupported {
                set.otherwise_deferred(|scope| {
                    scope.unsupported_platform();
                    None
                })?;
            }
            Ok(None)
        })?;
    Ok(chosen)
}

/// Replace `{name}` with the dependency's variable, leaving unknown names as-is
fn interpolate(template: &str, scope: &ChoiceScope<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match scope.var(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + end + 2]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
