//! Child process operations (captured queries, streamed output, delegation).

use anyhow::{Context, Result, bail};
use log::debug;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use super::{Environment, LineStream, RealRuntime};

/// Build a `Command` for `args[0]` whose environment is exactly `env`.
fn command_for(args: &[String], env: &Environment) -> Result<Command> {
    let Some((program, rest)) = args.split_first() else {
        bail!("No program given to run");
    };
    let mut cmd = Command::new(program);
    cmd.args(rest).env_clear().envs(env);
    Ok(cmd)
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Map an exit status to a process exit code. A child killed by a signal
/// reports `128 + signal`, as shells do.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Stdout of a running child, read one line at a time. The child is reaped
/// once its output is exhausted, or when the stream is dropped early.
struct ChildLines {
    child: Child,
    reader: BufReader<ChildStdout>,
    finished: bool,
}

impl ChildLines {
    fn finish(&mut self) {
        self.finished = true;
        match self.child.wait() {
            Ok(status) => debug!("Streamed child exited with {}", status),
            Err(e) => debug!("Failed to wait for streamed child: {}", e),
        }
    }
}

impl Drop for ChildLines {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Drain so a child blocked on a full pipe can run to completion.
        if let Err(e) = io::copy(&mut self.reader, &mut io::sink()) {
            debug!("Failed to drain streamed child output: {}", e);
        }
        self.finish();
    }
}

impl Iterator for ChildLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.finish();
                None
            }
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => {
                self.finish();
                Some(Err(anyhow::Error::new(e).context("Failed to read child output")))
            }
        }
    }
}

impl RealRuntime {
    #[tracing::instrument(skip(self, env))]
    pub(crate) fn run_captured_impl(&self, command: &str, env: &Environment) -> Option<String> {
        let output = shell_command(command)
            .env_clear()
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                debug!("`{}` exited with {}", command, output.status);
                None
            }
            Err(e) => {
                debug!("Failed to run `{}`: {}", command, e);
                None
            }
        }
    }

    #[tracing::instrument(skip(self, env))]
    pub(crate) fn stream_lines_impl(&self, args: &[String], env: &Environment) -> Result<LineStream> {
        let mut child = command_for(args, env)?
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", args[0]))?;

        let stdout = child.stdout.take().context("Child has no stdout")?;
        Ok(Box::new(ChildLines {
            child,
            reader: BufReader::new(stdout),
            finished: false,
        }))
    }

    #[tracing::instrument(skip(self, env))]
    pub(crate) fn status_impl(&self, args: &[String], env: &Environment) -> Result<i32> {
        let status = command_for(args, env)?
            .status()
            .with_context(|| format!("Failed to run {}", args[0]))?;
        Ok(exit_code(status))
    }
}
