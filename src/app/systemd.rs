// Handles all interactions with the `systemctl` command.

use crate::config::Settings;
use crate::error::{Error, Result};
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Captured result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam between the components and the OS process table.
pub trait CommandRunner {
    /// Runs `program` to completion, capturing stdout and stderr.
    fn output(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;

    /// Starts `program` in its own process group with null stdio and does not wait.
    fn spawn_detached(&self, program: &str, args: &[String]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        debug!(program, ?args, "running command");
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> io::Result<()> {
        debug!(program, ?args, "spawning detached command");
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map(drop)
    }
}

/// Renders `program args..` for log and error messages.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a command and turns spawn errors and non-zero exits into [`Error`].
pub fn run_checked<R: CommandRunner>(runner: &R, program: &str, args: &[String]) -> Result<CommandOutput> {
    let command = command_line(program, args);
    let output = runner
        .output(program, args)
        .map_err(|e| Error::spawn(program, command.clone(), e))?;

    if output.success() {
        Ok(output)
    } else {
        Err(Error::CommandFailed {
            command,
            stderr: output.stderr,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }
}

/// `systemctl` wrapper for the one supervised unit.
#[derive(Debug, Clone)]
pub struct ServiceController<R> {
    runner: R,
    program: String,
    is_active_args: Vec<String>,
    start_args: Vec<String>,
    stop_args: Vec<String>,
}

impl<R: CommandRunner> ServiceController<R> {
    pub fn new(settings: &Settings, runner: R) -> Self {
        Self {
            runner,
            program: settings.tools.systemctl.clone(),
            is_active_args: settings.systemctl_args("is-active"),
            start_args: settings.systemctl_args(ServiceAction::Start.as_str()),
            stop_args: settings.systemctl_args(ServiceAction::Stop.as_str()),
        }
    }

    /// True only when `is-active` prints exactly `active`. Any failure to ask
    /// counts as not running.
    pub fn is_running(&self) -> bool {
        match self.runner.output(&self.program, &self.is_active_args) {
            Ok(output) => output.stdout.trim() == "active",
            Err(e) => {
                warn!("Error checking service status: {e}");
                false
            }
        }
    }

    pub fn start(&self) -> Result<()> {
        info!("starting service");
        self.control(ServiceAction::Start).inspect_err(|e| {
            warn!("Error starting service: {e}");
        })
    }

    /// Best effort: failures are logged, never returned.
    pub fn stop(&self) {
        info!("stopping service");
        if let Err(e) = self.control(ServiceAction::Stop) {
            warn!("Error stopping service: {e}");
        }
    }

    fn control(&self, action: ServiceAction) -> Result<()> {
        let args = match action {
            ServiceAction::Start => &self.start_args,
            ServiceAction::Stop => &self.stop_args,
        };
        run_checked(&self.runner, &self.program, args).map(drop)
    }
}
