//! Failure taxonomy for a single code unit and for a whole batch.

use serde::Serialize;

use crate::backend::Library;

/// Unit-local failure. Always recovered into that unit's response; never aborts a batch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("syntax error: {message}")]
    SyntaxInspection { message: String, trace: String },

    #[error("unresolved dependency `{name}`: {message}")]
    UnresolvedDependency {
        name: String,
        message: String,
        trace: String,
    },

    #[error("runtime error: {message}")]
    Runtime { message: String, trace: String },

    #[error("result symbol `{symbol}` was not bound by the code")]
    MissingResultSymbol { symbol: String, trace: String },

    #[error("unexpected result shape: {message}")]
    ArtifactShape { message: String, trace: String },

    #[error("execution timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("interpreter error: {message}")]
    Interpreter { message: String, trace: String },
}

impl ExecutionError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::SyntaxInspection {
            message: msg.into(),
            trace: String::new(),
        }
    }

    pub fn unresolved(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            name: name.into(),
            message: msg.into(),
            trace: String::new(),
        }
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ArtifactShape {
            message: msg.into(),
            trace: String::new(),
        }
    }

    /// Attach diagnostic context to an error raised on this side of the process boundary.
    pub fn with_trace(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::SyntaxInspection { trace, .. }
            | Self::UnresolvedDependency { trace, .. }
            | Self::Runtime { trace, .. }
            | Self::MissingResultSymbol { trace, .. }
            | Self::ArtifactShape { trace, .. }
            | Self::Interpreter { trace, .. } => *trace = context.into(),
            Self::Timeout { .. } => {}
        }
        self
    }

    pub fn interpreter(msg: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Interpreter {
            message: msg.into(),
            trace: trace.into(),
        }
    }

    /// Stable snake_case tag, also used on the interpreter wire protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyntaxInspection { .. } => "syntax",
            Self::UnresolvedDependency { .. } => "unresolved_dependency",
            Self::Runtime { .. } => "runtime",
            Self::MissingResultSymbol { .. } => "missing_result_symbol",
            Self::ArtifactShape { .. } => "artifact_shape",
            Self::Timeout { .. } => "timeout",
            Self::Interpreter { .. } => "interpreter",
        }
    }

    pub fn trace(&self) -> &str {
        match self {
            Self::SyntaxInspection { trace, .. }
            | Self::UnresolvedDependency { trace, .. }
            | Self::Runtime { trace, .. }
            | Self::MissingResultSymbol { trace, .. }
            | Self::ArtifactShape { trace, .. }
            | Self::Interpreter { trace, .. } => trace,
            Self::Timeout { .. } => "",
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind().to_string(),
            message: self.to_string(),
            traceback: self.trace().to_string(),
        }
    }
}

/// Error detail attached to a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    pub traceback: String,
}

/// The only batch-fatal error: raised before any unit is processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported library `{requested}`; supported libraries are {}", supported_list())]
pub struct UnsupportedLibrary {
    pub requested: String,
}

fn supported_list() -> String {
    Library::ALL
        .iter()
        .map(|lib| lib.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of a whole batch call.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    UnsupportedLibrary(#[from] UnsupportedLibrary),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
