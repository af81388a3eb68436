use depkit::{CommandOutput, ProcessExecutor, RunOptions};
use std::io::Write;
use std::process::{Command, Stdio};

use crate::ui;

/// Runs commands on this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor {
    quiet: bool,
}

impl SystemExecutor {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

/// The command line that will actually run, with `sudo -u` when acting
/// as another user
pub fn command_line(cmd: &str, args: &[&str], opts: &RunOptions) -> (String, Vec<String>) {
    let mut argv: Vec<String> = Vec::with_capacity(args.len() + 3);
    let program = match &opts.as_user {
        Some(user) => {
            argv.extend(["-u".to_string(), user.clone(), cmd.to_string()]);
            "sudo".to_string()
        }
        None => cmd.to_string(),
    };
    argv.extend(args.iter().map(|a| (*a).to_string()));
    (program, argv)
}

impl ProcessExecutor for SystemExecutor {
    fn run(&self, cmd: &str, args: &[&str], opts: &RunOptions) -> depkit::Result<CommandOutput> {
        let (program, argv) = command_line(cmd, args, opts);
        let display = format!("{} {}", program, argv.join(" "));
        log::debug!("Running: {}", display);

        let mut command = Command::new(&program);
        command
            .args(&argv)
            .stdin(if opts.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let pb = (opts.spinner && !self.quiet).then(|| ui::spinner(&display));

        let mut child = command.spawn().map_err(|e| depkit::Error::CommandFailed {
            command: display.clone(),
            message: format!("Failed to execute: {}", e),
        })?;

        // Written from a thread: the child may block on a full stdout pipe.
        let feeder = match (opts.input.clone(), child.stdin.take()) {
            (Some(input), Some(mut stdin)) => {
                Some(std::thread::spawn(move || stdin.write_all(input.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output();
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        let output: CommandOutput = output?.into();

        if let Some(feeder) = feeder {
            if let Ok(Err(e)) = feeder.join() {
                log::debug!("Couldn't write stdin of {}: {}", display, e);
            }
        }

        if !output.success && !opts.failable {
            log::warn!("{} failed: {}", display, output.stderr_str().trim());
        }
        Ok(output)
    }
}
