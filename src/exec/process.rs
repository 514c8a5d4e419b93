// src/exec/process.rs

//! Shell process runner shared by the local engine and the PBS backend.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Fully buffered result of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; `-1` when killed by a signal or timed out.
    pub exit_code: i32,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` in a shell and wait for it, capturing stdout and stderr.
///
/// With a `timeout`, a command still running when it elapses is killed and
/// reported with `timed_out = true`.
pub async fn run_shell(
    cmd: &str,
    working_dir: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    let mut command = shell_command(cmd);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    let child = command
        .spawn()
        .with_context(|| format!("spawning shell for `{cmd}`"))?;

    let waited = child.wait_with_output();
    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, waited).await {
            Ok(res) => res,
            Err(_) => {
                // Dropping the future drops the child, which kills it.
                warn!(cmd = %cmd, ?limit, "command timed out; killed");
                return Ok(CommandOutput {
                    stdout: String::new(),
                    stderr: format!("command timed out after {}s", limit.as_secs_f64()),
                    exit_code: -1,
                    timed_out: true,
                });
            }
        },
        None => waited.await,
    }
    .with_context(|| format!("waiting for `{cmd}`"))?;

    let exit_code = output.status.code().unwrap_or(-1);
    debug!(cmd = %cmd, exit_code, "command exited");

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
        timed_out: false,
    })
}
