//! Command location verification
//!
//! Checks that the commands a dependency provides are all present and all
//! come from one place. Mixing commands from our own install mechanism with
//! commands from elsewhere is always reported as a conflict: a check must
//! never take credit for commands it didn't install.
//!
//! The decision ([`classify`]) is pure; [`report`] does the logging.

use crate::context::{InstallSource, ProcessExecutor};
use crate::probe::PathProbe;
use crate::text::{pluralize, quoted_list};
use crate::types::{CommandLocation, Located};
use std::path::{Path, PathBuf};

/// Classify resolved commands into a [`CommandLocation`]
///
/// `resolved` pairs each command name with the directory it runs from (or
/// `None` if it doesn't resolve). `is_ours` decides which present commands
/// belong to the component's own install mechanism. Commands that aren't
/// ours must all come from one single directory.
pub fn classify<F>(resolved: &[(String, Option<PathBuf>)], is_ours: F) -> CommandLocation
where
    F: Fn(&str, &Path) -> bool,
{
    let mut ours: Option<Located> = None;
    let mut other: Vec<Located> = Vec::new();
    let mut missing = Vec::new();

    for (name, dir) in resolved {
        match dir {
            Some(dir) if is_ours(name.as_str(), dir.as_path()) => ours
                .get_or_insert_with(|| Located {
                    commands: Vec::new(),
                    dir: dir.clone(),
                })
                .commands
                .push(name.clone()),
            Some(dir) => match other.iter_mut().find(|group| group.dir == *dir) {
                Some(group) => group.commands.push(name.clone()),
                None => other.push(Located {
                    commands: vec![name.clone()],
                    dir: dir.clone(),
                }),
            },
            None => missing.push(name.clone()),
        }
    }

    let sources = usize::from(ours.is_some()) + other.len();
    if sources > 1 {
        let mut locations: Vec<Located> = ours.into_iter().collect();
        locations.extend(other);
        return CommandLocation::Conflicting { locations };
    }

    if !missing.is_empty() {
        return CommandLocation::Missing { missing };
    }

    match (ours, other.pop()) {
        (Some(location), _) => CommandLocation::InPath {
            location,
            ours: true,
        },
        (None, Some(location)) => CommandLocation::InPath {
            location,
            ours: false,
        },
        // Nothing was asked for, so nothing is missing
        (None, None) => CommandLocation::InPath {
            location: Located {
                commands: Vec::new(),
                dir: PathBuf::new(),
            },
            ours: false,
        },
    }
}

/// "'a' runs from /usr/bin" / "'a' and 'b' run from /usr/bin"
pub fn location_phrase(location: &Located) -> String {
    format!(
        "{} {} from {}",
        quoted_list(&location.commands),
        pluralize(location.commands.len(), "runs", "run"),
        location.dir.display()
    )
}

/// The one-line message describing a check outcome
pub fn message(dep_name: &str, location: &CommandLocation) -> String {
    match location {
        CommandLocation::InPath { location, .. } => format!("{}.", location_phrase(location)),
        CommandLocation::Missing { missing } => format!(
            "{} {} missing.",
            quoted_list(missing),
            pluralize(missing.len(), "is", "are")
        ),
        CommandLocation::Conflicting { locations } => {
            let phrases: Vec<String> = locations.iter().map(location_phrase).collect();
            format!(
                "The commands for {} run from more than one place: {}.",
                dep_name,
                phrases.join(", but ")
            )
        }
    }
}

/// Log the outcome of a check
pub fn report(dep_name: &str, location: &CommandLocation) {
    let msg = message(dep_name, location);
    match location {
        CommandLocation::InPath { .. } => log::info!("{}", msg),
        CommandLocation::Missing { .. } => log::warn!("{}", msg),
        CommandLocation::Conflicting { .. } => log::error!("{}", msg),
    }
}

/// Verifies that a dependency's commands come from one consistent place
pub struct CommandLocationVerifier<'a, E> {
    probe: PathProbe<E>,
    source: &'a dyn InstallSource,
}

impl<'a, E: ProcessExecutor> CommandLocationVerifier<'a, E> {
    pub fn new(executor: E, source: &'a dyn InstallSource) -> Self {
        Self {
            probe: PathProbe::new(executor),
            source,
        }
    }

    /// Resolve each command's directory, once per name
    pub fn resolve(&self, commands: &[&str]) -> Vec<(String, Option<PathBuf>)> {
        commands
            .iter()
            .map(|name| ((*name).to_string(), self.probe.cmd_dir(name)))
            .collect()
    }

    /// Classify without logging
    ///
    /// With `custom_dir`, "ours" means "runs from exactly that directory";
    /// otherwise the install source decides.
    pub fn classify(&self, commands: &[&str], custom_dir: Option<&Path>) -> CommandLocation {
        let resolved = self.resolve(commands);
        match custom_dir {
            Some(custom) => classify(&resolved, |_, dir| dir == custom),
            None => classify(&resolved, |name, dir| self.source.provides(name, dir)),
        }
    }

    /// Check and report whether `commands` are in the PATH from one place
    pub fn commands_in_path(
        &self,
        dep_name: &str,
        commands: &[&str],
        custom_dir: Option<&Path>,
    ) -> CommandLocation {
        let location = self.classify(commands, custom_dir);
        report(dep_name, &location);
        location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PrefixInstallSource;
    use crate::probe::tests::WhichTable;

    fn brew() -> PrefixInstallSource {
        PrefixInstallSource::new("homebrew", vec![PathBuf::from("/opt/homebrew/bin")])
    }

    #[test]
    fn test_all_from_other_location_is_met() {
        let source = brew();
        let exec = WhichTable::new(&[("git", "/usr/bin/git"), ("gitk", "/usr/bin/gitk")]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.commands_in_path("git", &["git", "gitk"], None);
        assert_eq!(
            result,
            CommandLocation::InPath {
                location: Located {
                    commands: vec!["git".into(), "gitk".into()],
                    dir: "/usr/bin".into(),
                },
                ours: false,
            }
        );
        assert_eq!(message("git", &result), "'git' and 'gitk' run from /usr/bin.");
    }

    #[test]
    fn test_all_ours_is_met() {
        let source = brew();
        let exec = WhichTable::new(&[("psql", "/opt/homebrew/bin/psql")]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.classify(&["psql"], None);
        assert!(result.is_met());
        assert_eq!(message("postgres", &result), "'psql' runs from /opt/homebrew/bin.");
    }

    #[test]
    fn test_mixed_sources_conflict() {
        let source = brew();
        let exec = WhichTable::new(&[
            ("psql", "/opt/homebrew/bin/psql"),
            ("pg_dump", "/usr/bin/pg_dump"),
        ]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.commands_in_path("postgres", &["psql", "pg_dump"], None);
        assert!(result.is_conflicting());
        assert_eq!(
            message("postgres", &result),
            "The commands for postgres run from more than one place: \
             'psql' runs from /opt/homebrew/bin, but 'pg_dump' runs from /usr/bin."
        );
    }

    #[test]
    fn test_custom_dir_conflict() {
        // {a,b} in /usr/bin and {c} in /usr/local/bin, with /usr/bin as ours
        let source = brew();
        let exec = WhichTable::new(&[
            ("a", "/usr/bin/a"),
            ("b", "/usr/bin/b"),
            ("c", "/usr/local/bin/c"),
        ]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.classify(&["a", "b", "c"], Some(Path::new("/usr/bin")));
        assert_eq!(
            result,
            CommandLocation::Conflicting {
                locations: vec![
                    Located {
                        commands: vec!["a".into(), "b".into()],
                        dir: "/usr/bin".into(),
                    },
                    Located {
                        commands: vec!["c".into()],
                        dir: "/usr/local/bin".into(),
                    },
                ],
            }
        );
    }

    #[test]
    fn test_two_foreign_locations_conflict() {
        // Neither /usr/bin nor /usr/local/bin is ours
        let source = brew();
        let exec = WhichTable::new(&[
            ("a", "/usr/bin/a"),
            ("b", "/usr/bin/b"),
            ("c", "/usr/local/bin/c"),
        ]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.classify(&["a", "b", "c"], None);
        assert!(result.is_conflicting());
        assert_eq!(
            message("abc", &result),
            "The commands for abc run from more than one place: \
             'a' and 'b' run from /usr/bin, but 'c' runs from /usr/local/bin."
        );
    }

    #[test]
    fn test_conflict_wins_over_missing() {
        let source = brew();
        let exec = WhichTable::new(&[("a", "/opt/homebrew/bin/a"), ("b", "/usr/bin/b")]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.classify(&["a", "b", "nope"], None);
        assert!(result.is_conflicting());
    }

    #[test]
    fn test_single_missing_message() {
        let source = brew();
        let verifier = CommandLocationVerifier::new(WhichTable::new(&[]), &source);

        let result = verifier.commands_in_path("x", &["x"], None);
        assert_eq!(
            result,
            CommandLocation::Missing {
                missing: vec!["x".into()]
            }
        );
        assert_eq!(message("x", &result), "'x' is missing.");
    }

    #[test]
    fn test_multiple_missing_message() {
        let source = brew();
        let verifier = CommandLocationVerifier::new(WhichTable::new(&[]), &source);

        let result = verifier.classify(&["x", "y"], None);
        assert_eq!(message("xy", &result), "'x' and 'y' are missing.");
    }

    #[test]
    fn test_partially_missing_is_unmet() {
        let source = brew();
        let exec = WhichTable::new(&[("x", "/usr/bin/x")]);
        let verifier = CommandLocationVerifier::new(exec, &source);

        let result = verifier.classify(&["x", "y"], None);
        assert_eq!(
            result,
            CommandLocation::Missing {
                missing: vec!["y".into()]
            }
        );
    }

    #[test]
    fn test_classify_ours_across_bin_dirs() {
        let resolved = vec![
            ("a".to_string(), Some(PathBuf::from("/opt/homebrew/bin"))),
            ("b".to_string(), Some(PathBuf::from("/opt/homebrew/sbin"))),
        ];
        let result = classify(&resolved, |_, dir| dir.starts_with("/opt/homebrew"));
        assert_eq!(
            result,
            CommandLocation::InPath {
                location: Located {
                    commands: vec!["a".into(), "b".into()],
                    dir: "/opt/homebrew/bin".into(),
                },
                ours: true,
            }
        );
    }

    #[test]
    fn test_classify_nothing_requested() {
        assert!(classify(&[], |_, _| false).is_met());
    }
}
