//! Python interpreter process bootstrap and I/O glue.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

use super::ProcessHandle;

/// Child side of the run protocol: reads one request on stdin, writes one reply on stdout.
pub const BOOTSTRAP: &str = include_str!("bootstrap.py");

pub fn start_python(interpreter: &Path, envs: &[(String, String)]) -> Result<ProcessHandle> {
    let mut cmd = Command::new(interpreter);
    cmd.arg("-u") // unbuffered
        .arg("-c")
        .arg(BOOTSTRAP)
        .env("MPLBACKEND", "Agg")
        .env("PYTHONDONTWRITEBYTECODE", "1")
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let mut child: Child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn interpreter {}", interpreter.display()))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow::anyhow!("no stdin"))?;

    Ok(ProcessHandle { child, stdin })
}
