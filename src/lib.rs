//! Turns LLM-generated chart code into runnable units, executes each one in its
//! own interpreter process and extracts a portable artifact per unit.
//!
//! ```no_run
//! use chartexec::{ChartExecutor, ChartSummary, Config, Dataset};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let executor = ChartExecutor::from_config(&Config::load());
//! let dataset = Dataset::from_path("cars.csv")?;
//! let responses = executor
//!     .execute(&[generated_code()], &dataset, &ChartSummary::new("cars.csv"), "altair", true)
//!     .await?;
//! for r in responses {
//!     println!("{} {:?}", r.status, r.error);
//! }
//! # Ok(())
//! # }
//! # fn generated_code() -> String { String::new() }
//! ```

pub mod artifact;
pub mod backend;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod execution;
pub mod normalize;
pub mod process;
pub mod resolve;

pub use artifact::{Artifact, DatasetRef, RasterImage, StructuredSpec};
pub use backend::{BackendKind, Library, RenderBackend, ResultValue};
pub use batch::{ChartExecutor, ChartSummary, ExecutionResponse};
pub use config::{Config, ExecutorSettings};
pub use dataset::{Dataset, DatasetFormat, StagedDataset};
pub use error::{BatchError, ErrorInfo, ExecutionError, UnsupportedLibrary};
pub use execution::{Engine, ExecutionResult};
pub use normalize::{normalize, CodeUnit, Normalizer, ENTRY_MARKER, RESULT_SYMBOL};
pub use resolve::{BindingPrecedence, ExecutionContext, FixedBindings, Resolver};
