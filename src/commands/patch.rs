use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use patchkit::{
    ConfigStatus, InsertOptions, PatchOutcome, Patcher, Pattern, PrivilegedWriter, RecordingWriter, Stamp,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::{PatchArgs, PatchCommand};
use crate::config::Config;
use crate::paths;
use crate::runner::SystemExecutor;
use crate::sudo::SudoWriter;
use crate::ui;

pub fn run(ctx: &Context, args: PatchArgs) -> Result<()> {
    let config = Config::load()?;

    match &args.command {
        PatchCommand::Status { file } => return status(&config, &target(file)),
        PatchCommand::Grep { file, pattern, regex } => return grep(&target(file), pattern, *regex),
        _ => {}
    }

    if args.dry_run {
        let recorder = RecordingWriter::new();
        let patcher = patcher(&recorder, &config);
        let outcome = apply(&patcher, &args.command)?;
        show_dry_run(&recorder, outcome);
        return Ok(());
    }

    let writer = SudoWriter::new(SystemExecutor::new(ctx.quiet), config.sudo.enabled);
    let patcher = patcher(writer, &config);
    match apply(&patcher, &args.command)? {
        PatchOutcome::Applied => ui::success("Done"),
        PatchOutcome::AlreadyApplied => ui::dim("Nothing to do"),
    }
    Ok(())
}

fn patcher<W: PrivilegedWriter>(writer: W, config: &Config) -> Patcher<W> {
    let stamp = Stamp::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Patcher::new(writer, stamp).with_comment_char(config.marker.comment_char.clone())
}

fn target(file: &Path) -> PathBuf {
    paths::expand(&file.to_string_lossy())
}

/// Run one of the mutating patch commands
fn apply<W: PrivilegedWriter>(patcher: &Patcher<W>, command: &PatchCommand) -> Result<PatchOutcome> {
    let outcome = match command {
        PatchCommand::ChangeLine {
            file,
            line,
            replacement,
        } => patcher.change_line(line, replacement, &target(file))?,
        PatchCommand::Insert {
            file,
            before,
            text,
            after,
            comment_char,
        } => {
            let opts = InsertOptions {
                comment_char: comment_char.clone(),
                insert_after: after.clone(),
            };
            patcher.insert_into_file(before, &target(file), &text.join("\n"), &opts)?
        }
        PatchCommand::Append { file, text } => patcher.append_to_file(&text.join("\n"), &target(file))?,
        PatchCommand::Directive {
            file,
            keyword,
            from,
            to,
        } => patcher.set_directive(keyword, from, to, &target(file))?,
        PatchCommand::Status { .. } | PatchCommand::Grep { .. } => {
            bail!("not a file edit")
        }
    };
    Ok(outcome)
}

fn show_dry_run(recorder: &RecordingWriter, outcome: PatchOutcome) {
    if !outcome.is_applied() {
        ui::dim("Nothing to do");
        return;
    }
    for write in recorder.writes() {
        let before = fs::read_to_string(&write.path).unwrap_or_default();
        let how = if write.elevate { " (as owner, via sudo)" } else { "" };
        println!("  {} {}{}", "Would write".yellow(), write.path.display(), how.dimmed());
        ui::print_diff(&before, &write.content);
    }
}

fn status(config: &Config, path: &Path) -> Result<()> {
    let patcher = patcher(RecordingWriter::new(), config);
    let status = patcher.config_status(path)?;
    match status {
        ConfigStatus::Generated => ui::success(&format!("{}: {}", path.display(), status.reason())),
        ConfigStatus::Missing | ConfigStatus::NeedsRegeneration => {
            bail!("{}: {}", path.display(), status.reason())
        }
    }
    Ok(())
}

fn grep(path: &Path, pattern: &str, regex: bool) -> Result<()> {
    let pattern = if regex {
        Pattern::regex(pattern).with_context(|| format!("Invalid pattern '{}'", pattern))?
    } else {
        Pattern::from(pattern)
    };
    match patchkit::grep(&pattern, path)? {
        Some(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        None => bail!("No matches in {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dry_run_records_without_writing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hosts");
        fs::write(&path, "127.0.0.1 localhost\n# END\n").unwrap();

        let recorder = RecordingWriter::new();
        let patcher = patcher(&recorder, &Config::default());
        let cmd = PatchCommand::Insert {
            file: path.clone(),
            before: "# END".to_string(),
            text: vec!["10.0.0.1 db".to_string()],
            after: None,
            comment_char: None,
        };

        let outcome = apply(&patcher, &cmd).unwrap();

        assert!(outcome.is_applied());
        assert_eq!(fs::read_to_string(&path).unwrap(), "127.0.0.1 localhost\n# END\n");
        let written = recorder.last_for(&path).unwrap();
        assert!(written.contains("# This line added by provision-"));
        assert!(written.contains("10.0.0.1 db\n# END\n"));
    }

    #[test]
    fn test_append_joins_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile");

        let recorder = RecordingWriter::new();
        let patcher = patcher(&recorder, &Config::default());
        let cmd = PatchCommand::Append {
            file: path.clone(),
            text: vec!["export A=1".to_string(), "export B=2".to_string()],
        };

        apply(&patcher, &cmd).unwrap();

        let written = recorder.last_for(&path).unwrap();
        assert!(written.contains("# These 2 lines added by provision-"));
        assert!(written.contains("export A=1\nexport B=2"));
    }

    #[test]
    fn test_configured_comment_char() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("init.lua");
        fs::write(&path, "vim.o.number = false\n").unwrap();

        let mut config = Config::default();
        config.marker.comment_char = "--".to_string();
        let recorder = RecordingWriter::new();
        let patcher = patcher(&recorder, &config);
        let cmd = PatchCommand::ChangeLine {
            file: path.clone(),
            line: "vim.o.number".to_string(),
            replacement: "vim.o.number = true".to_string(),
        };

        apply(&patcher, &cmd).unwrap();

        let written = recorder.last_for(&path).unwrap();
        assert!(written.contains("-- was: vim.o.number = false"));
        assert!(written.ends_with("vim.o.number = true\n"));
    }

    #[test]
    fn test_missing_anchor_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hosts");
        fs::write(&path, "127.0.0.1 localhost\n").unwrap();

        let recorder = RecordingWriter::new();
        let patcher = patcher(&recorder, &Config::default());
        let cmd = PatchCommand::Insert {
            file: path,
            before: "# END".to_string(),
            text: vec!["x".to_string()],
            after: None,
            comment_char: None,
        };

        assert!(apply(&patcher, &cmd).is_err());
        assert!(recorder.writes().is_empty());
    }

    #[test]
    fn test_status_of_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(status(&Config::default(), &temp.path().join("nginx.conf")).is_err());
    }

    #[test]
    fn test_grep_regex() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sshd_config");
        fs::write(&path, "PermitRootLogin yes\nPort 22\n").unwrap();

        assert!(grep(&path, "^Port\\s+\\d+", true).is_ok());
        assert!(grep(&path, "Banner", false).is_err());
        assert!(grep(&path, "(", true).is_err());
    }
}
