//! Batch coordinator: runs candidate code units under one backend, isolating each
//! unit's failure and keeping responses in request order.

use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::{
    artifact::{Artifact, DatasetRef},
    backend::{self, Extracted, Library, RenderBackend},
    config::{Config, ExecutorSettings},
    dataset::{Dataset, StagedDataset},
    error::{BatchError, ErrorInfo, ExecutionError},
    execution::Engine,
    normalize::{CodeUnit, Normalizer},
    resolve::Resolver,
};

/// The part of the goal/summary descriptor the executor needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSummary {
    #[serde(default)]
    pub name: Option<String>,
    /// Display file name of the dataset; spec artifacts reference it by URL.
    pub file_name: String,
    #[serde(default)]
    pub dataset_description: Option<String>,
}

impl ChartSummary {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }
}

/// Externally visible record for one code unit.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResponse {
    pub status: bool,
    pub artifact: Artifact,
    /// The normalized code that was actually run.
    pub code: String,
    pub library: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ExecutionResponse {
    fn success(unit: &CodeUnit, library: Library, extracted: Extracted) -> Self {
        Self {
            status: true,
            artifact: extracted.artifact,
            code: unit.code().to_string(),
            library: library.to_string(),
            table: extracted.table,
            columns: extracted.columns,
            error: None,
        }
    }

    fn failure(unit: &CodeUnit, library: Library, err: &ExecutionError) -> Self {
        Self {
            status: false,
            artifact: Artifact::Absent,
            code: unit.code().to_string(),
            library: library.to_string(),
            table: None,
            columns: None,
            error: Some(err.info()),
        }
    }
}

pub struct ChartExecutor {
    settings: ExecutorSettings,
    normalizer: Normalizer,
    resolver: Resolver,
    engine: Engine,
}

impl ChartExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        let resolver = Resolver::new(settings.fixed.clone(), settings.precedence);
        let engine = Engine::from_settings(&settings);
        Self {
            settings,
            normalizer: Normalizer::default(),
            resolver,
            engine,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(ExecutorSettings::from_config(cfg))
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Normalize, resolve, execute and extract every candidate.
    ///
    /// Only an unsupported `library` (checked before anything runs) or a dataset
    /// that cannot be staged fails the call. Unit failures are dropped from the
    /// output unless `return_error` is set, so the output may be shorter than
    /// `code_specs`.
    #[tracing::instrument(skip_all, fields(library = %library, units = code_specs.len()))]
    pub async fn execute<S: AsRef<str>>(
        &self,
        code_specs: &[S],
        dataset: &Dataset,
        summary: &ChartSummary,
        library: &str,
        return_error: bool,
    ) -> Result<Vec<ExecutionResponse>, BatchError> {
        let library: Library = library.parse()?;
        let backend = backend::for_library(library, &self.settings);
        let staged = dataset.stage(&self.settings.staging_path)?;
        let dataset_ref = DatasetRef::new(&self.settings.data_url_prefix, &summary.file_name);

        let units: Vec<CodeUnit> = code_specs
            .iter()
            .map(|raw| self.normalizer.normalize(raw.as_ref()))
            .collect();
        tracing::info!(units = units.len(), "normalized code units");

        let backend = backend.as_ref();
        let responses: Vec<ExecutionResponse> = stream::iter(units.iter().enumerate())
            .map(|(index, unit)| self.run_unit(index, unit, &staged, backend, &dataset_ref))
            .buffered(self.settings.max_parallel)
            .collect()
            .await;

        let total = responses.len();
        let kept: Vec<ExecutionResponse> = responses
            .into_iter()
            .filter(|r| return_error || r.status)
            .collect();
        tracing::info!(total, returned = kept.len(), "batch finished");
        Ok(kept)
    }

    async fn run_unit(
        &self,
        index: usize,
        unit: &CodeUnit,
        staged: &StagedDataset,
        backend: &dyn RenderBackend,
        dataset_ref: &DatasetRef,
    ) -> ExecutionResponse {
        let library = backend.library();
        let outcome = match self.resolver.resolve(unit, staged) {
            Ok(context) => {
                let result = self
                    .engine
                    .execute(unit, context, &backend.export_mode())
                    .await;
                if !result.output.is_empty() {
                    tracing::debug!(index, output = %result.output, "unit output");
                }
                result
                    .outcome
                    .and_then(|value| backend.extract(value, dataset_ref))
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(extracted) => ExecutionResponse::success(unit, library, extracted),
            Err(err) => {
                tracing::warn!(
                    index,
                    kind = err.kind(),
                    error = %err,
                    trace = err.trace(),
                    original = unit.original(),
                    "code unit failed"
                );
                ExecutionResponse::failure(unit, library, &err)
            }
        }
    }
}
