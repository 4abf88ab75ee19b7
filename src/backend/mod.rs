//! Render backends: how a unit's result is exported by the interpreter and
//! turned into an [`Artifact`](crate::artifact::Artifact).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    artifact::{Artifact, DatasetRef},
    config::ExecutorSettings,
    error::{ExecutionError, UnsupportedLibrary},
};

pub mod declarative;
pub mod figure;

pub use declarative::DeclarativeSpecBackend;
pub use figure::{FigureAxesBackend, FigureOnlyBackend};

/// Chart libraries accepted by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Library {
    Altair,
    Matplotlib,
    Seaborn,
    Ggplot,
    Plotly,
}

impl Library {
    pub const ALL: [Library; 5] = [
        Library::Altair,
        Library::Matplotlib,
        Library::Seaborn,
        Library::Ggplot,
        Library::Plotly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Altair => "altair",
            Self::Matplotlib => "matplotlib",
            Self::Seaborn => "seaborn",
            Self::Ggplot => "ggplot",
            Self::Plotly => "plotly",
        }
    }

    pub fn kind(self) -> BackendKind {
        match self {
            Self::Altair => BackendKind::DeclarativeSpec,
            Self::Matplotlib | Self::Seaborn => BackendKind::ImperativeFigureAxes,
            Self::Ggplot | Self::Plotly => BackendKind::ImperativeFigureOnly,
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Library {
    type Err = UnsupportedLibrary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lib| lib.as_str() == s)
            .ok_or_else(|| UnsupportedLibrary {
                requested: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    DeclarativeSpec,
    ImperativeFigureAxes,
    ImperativeFigureOnly,
}

/// How the interpreter serializes a figure-only surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureSerializer {
    /// `figure.save(buf, format="png")`
    SaveMethod,
    /// `plotly.io.to_image(figure, "png")`
    PlotlyImage,
}

/// Export instructions sent to the interpreter with each unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExportMode {
    Spec,
    FigureAxes { plot_module: String, dpi: u32 },
    Figure { serializer: FigureSerializer },
}

/// The interpreter's export of the result object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultValue {
    Spec {
        spec: serde_json::Value,
    },
    Raster {
        image: String,
        #[serde(default)]
        table: Option<serde_json::Value>,
        #[serde(default)]
        columns: Option<serde_json::Value>,
    },
}

impl ResultValue {
    fn describe(&self) -> &'static str {
        match self {
            Self::Spec { .. } => "a chart spec",
            Self::Raster { .. } => "a raster image",
        }
    }

    /// One-line outline of what the interpreter reported, for diagnostics.
    pub(crate) fn outline(&self) -> String {
        match self {
            Self::Spec { spec } => format!("spec: {}", json_outline(spec)),
            Self::Raster {
                image,
                table,
                columns,
            } => format!(
                "raster: {} base64 chars, table: {}, columns: {}",
                image.len(),
                table.as_ref().map_or("none".to_string(), json_outline),
                columns.as_ref().map_or("none".to_string(), json_outline),
            ),
        }
    }
}

pub(crate) fn json_outline(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object {{{}}}", keys.join(", "))
        }
    }
}

/// Artifact plus the data a figure+axes result passes through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub artifact: Artifact,
    pub table: Option<serde_json::Value>,
    pub columns: Option<serde_json::Value>,
}

impl From<Artifact> for Extracted {
    fn from(artifact: Artifact) -> Self {
        Self {
            artifact,
            table: None,
            columns: None,
        }
    }
}

pub trait RenderBackend: Send + Sync {
    fn library(&self) -> Library;

    fn kind(&self) -> BackendKind {
        self.library().kind()
    }

    fn export_mode(&self) -> ExportMode;

    /// Convert an exported result into an artifact. Any mismatch is an
    /// [`ExecutionError::ArtifactShape`].
    fn extract(
        &self,
        value: ResultValue,
        dataset: &DatasetRef,
    ) -> Result<Extracted, ExecutionError>;
}

/// Pick the backend for `library`. Done once per batch.
pub fn for_library(library: Library, settings: &ExecutorSettings) -> Box<dyn RenderBackend> {
    match library.kind() {
        BackendKind::DeclarativeSpec => Box::new(DeclarativeSpecBackend::new(library)),
        BackendKind::ImperativeFigureAxes => Box::new(FigureAxesBackend::new(
            library,
            settings.fixed.plot_module.clone(),
            settings.dpi,
        )),
        BackendKind::ImperativeFigureOnly => Box::new(FigureOnlyBackend::new(library)),
    }
}

fn unexpected(expected: &str, got: &ResultValue) -> ExecutionError {
    ExecutionError::shape(format!("expected {expected}, got {}", got.describe()))
        .with_trace(got.outline())
}
