//! Python run protocol: one JSON request on stdin, one JSON reply line on stdout.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, time::timeout};

use super::ExecutionResult;
use crate::{
    backend::{ExportMode, ResultValue},
    error::ExecutionError,
    normalize::CodeUnit,
    process::python::start_python,
    resolve::{Binding, ExecutionContext},
};

#[derive(Debug, Serialize)]
pub struct RunRequest<'a> {
    pub code: &'a str,
    pub bindings: Vec<Binding>,
    pub dataset: WireDataset,
    pub tabular_module: String,
    pub result_symbol: &'a str,
    pub export: &'a ExportMode,
}

#[derive(Debug, Serialize)]
pub struct WireDataset {
    pub path: PathBuf,
    pub loader: &'static str,
}

impl<'a> RunRequest<'a> {
    /// Takes the context by reference; the engine drops it once the request is built.
    pub fn new(
        unit: &'a CodeUnit,
        context: &ExecutionContext,
        export: &'a ExportMode,
        result_symbol: &'a str,
    ) -> Self {
        Self {
            code: unit.code(),
            bindings: context.bindings().to_vec(),
            dataset: WireDataset {
                path: context.dataset().path.clone(),
                loader: context.dataset().loader(),
            },
            tabular_module: context.tabular_module().to_string(),
            result_symbol,
            export,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RunReply {
    Ok {
        value: ResultValue,
    },
    Error {
        kind: String,
        message: String,
        #[serde(default)]
        trace: String,
        #[serde(default)]
        name: Option<String>,
    },
}

fn reply_error(kind: &str, message: String, trace: String, name: Option<String>) -> ExecutionError {
    match kind {
        "syntax" => ExecutionError::SyntaxInspection { message, trace },
        "unresolved_dependency" => ExecutionError::UnresolvedDependency {
            name: name.unwrap_or_default(),
            message,
            trace,
        },
        "runtime" => ExecutionError::Runtime { message, trace },
        "missing_result_symbol" => ExecutionError::MissingResultSymbol {
            symbol: name.unwrap_or_default(),
            trace,
        },
        "artifact_shape" => ExecutionError::ArtifactShape { message, trace },
        _ => ExecutionError::Interpreter { message, trace },
    }
}

fn parse_reply(stdout: &str) -> Option<RunReply> {
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| serde_json::from_str(line).ok())
}

pub async fn run(
    interpreter: &Path,
    envs: &[(String, String)],
    request: &RunRequest<'_>,
    limit: Option<Duration>,
) -> ExecutionResult {
    let payload = match serde_json::to_vec(request) {
        Ok(p) => p,
        Err(e) => {
            return ExecutionResult::failed(
                ExecutionError::interpreter(format!("encoding run request: {e}"), ""),
                "",
            )
        }
    };

    let mut handle = match start_python(interpreter, envs) {
        Ok(h) => h,
        Err(e) => return ExecutionResult::failed(ExecutionError::interpreter(format!("{e:#}"), ""), ""),
    };

    // A child that dies before reading still leaves its stderr for the diagnosis below.
    if let Err(e) = handle.stdin.write_all(&payload).await {
        tracing::debug!(error = %e, "interpreter closed stdin early");
    }
    drop(handle.stdin);

    let wait = handle.child.wait_with_output();
    let output = match limit {
        Some(limit) => match timeout(limit, wait).await {
            Ok(out) => out,
            Err(_) => {
                return ExecutionResult::failed(
                    ExecutionError::Timeout {
                        secs: limit.as_secs(),
                    },
                    "",
                )
            }
        },
        None => wait.await,
    };
    let output = match output {
        Ok(out) => out,
        Err(e) => {
            return ExecutionResult::failed(
                ExecutionError::interpreter(format!("waiting for interpreter: {e}"), ""),
                "",
            )
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    match parse_reply(&String::from_utf8_lossy(&output.stdout)) {
        Some(RunReply::Ok { value }) => ExecutionResult {
            outcome: Ok(value),
            output: stderr,
        },
        Some(RunReply::Error {
            kind,
            message,
            trace,
            name,
        }) => ExecutionResult::failed(reply_error(&kind, message, trace, name), stderr),
        None => ExecutionResult::failed(
            ExecutionError::interpreter(
                format!("interpreter exited ({}) without a reply", output.status),
                stderr.clone(),
            ),
            stderr,
        ),
    }
}
