//! Execution engine: runs one code unit against its context and returns a tagged result.
//!
//! Each unit gets its own interpreter process, so the context it ran in is gone
//! once the result is read. The unit may still perform arbitrary I/O: the process
//! boundary isolates units from each other, it is not a security sandbox.

use std::{path::PathBuf, time::Duration};

use crate::{
    backend::{ExportMode, ResultValue},
    config::ExecutorSettings,
    error::ExecutionError,
    normalize::{CodeUnit, RESULT_SYMBOL},
    resolve::ExecutionContext,
};

pub mod python;

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub outcome: Result<ResultValue, ExecutionError>,
    /// Whatever the unit wrote to stdout/stderr.
    pub output: String,
}

impl ExecutionResult {
    pub(crate) fn failed(err: ExecutionError, output: impl Into<String>) -> Self {
        Self {
            outcome: Err(err),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    interpreter: PathBuf,
    timeout: Option<Duration>,
    result_symbol: String,
    envs: Vec<(String, String)>,
}

impl Engine {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
            result_symbol: RESULT_SYMBOL.to_string(),
            envs: Vec::new(),
        }
    }

    pub fn from_settings(settings: &ExecutorSettings) -> Self {
        Self::new(settings.interpreter.clone(), settings.timeout)
    }

    /// Extra environment for every interpreter process (e.g. `PYTHONPATH`).
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Name the result is read back from after the unit ran.
    pub fn with_result_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.result_symbol = symbol.into();
        self
    }

    /// Run `unit` with `context` as its complete scope. Never fails: every problem,
    /// including a missing interpreter or an expired timeout, comes back as a failure.
    pub async fn execute(
        &self,
        unit: &CodeUnit,
        context: ExecutionContext,
        export: &ExportMode,
    ) -> ExecutionResult {
        let request = python::RunRequest::new(unit, &context, export, &self.result_symbol);
        python::run(&self.interpreter, &self.envs, &request, self.timeout).await
    }
}
