//! Dependency resolution: from a unit's imports to the scope it runs in.
//!
//! The plan built here is materialized into live objects inside the unit's own
//! interpreter process. Missing modules or attributes surface there as
//! `UnresolvedDependency` for that unit only.

use serde::Serialize;

use crate::{dataset::StagedDataset, error::ExecutionError, normalize::CodeUnit};

pub mod imports;

pub use imports::{scan_imports, ImportStmt};

/// Where a bound name comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingSource {
    Module { path: String },
    Attribute { module: String, attribute: String },
    Dataset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub name: String,
    pub source: BindingSource,
}

/// Which side wins when an explicit import and a fixed binding share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingPrecedence {
    /// Fixed bindings are applied last and replace explicit imports of the same name.
    #[default]
    FixedWins,
    /// Fixed bindings only fill names the unit did not import itself.
    ExplicitWins,
}

/// Names every unit can rely on without importing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBindings {
    pub tabular_module: String,
    pub tabular_alias: String,
    pub plot_module: String,
    pub plot_alias: String,
    pub dataset_symbol: String,
}

impl Default for FixedBindings {
    fn default() -> Self {
        Self {
            tabular_module: "polars".into(),
            tabular_alias: "pl".into(),
            plot_module: "matplotlib.pyplot".into(),
            plot_alias: "plt".into(),
            dataset_symbol: "data".into(),
        }
    }
}

impl FixedBindings {
    fn bindings(&self) -> [Binding; 3] {
        [
            Binding {
                name: self.tabular_alias.clone(),
                source: BindingSource::Module {
                    path: self.tabular_module.clone(),
                },
            },
            Binding {
                name: self.dataset_symbol.clone(),
                source: BindingSource::Dataset,
            },
            Binding {
                name: self.plot_alias.clone(),
                source: BindingSource::Module {
                    path: self.plot_module.clone(),
                },
            },
        ]
    }
}

/// The complete scope of one unit. Built fresh per unit and consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    bindings: Vec<Binding>,
    dataset: StagedDataset,
    tabular_module: String,
}

impl ExecutionContext {
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn get(&self, name: &str) -> Option<&BindingSource> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.source)
    }

    pub fn dataset(&self) -> &StagedDataset {
        &self.dataset
    }

    /// Module whose loader reads the dataset.
    pub fn tabular_module(&self) -> &str {
        &self.tabular_module
    }

    fn bind(&mut self, binding: Binding, replace: bool) {
        match self.bindings.iter_mut().find(|b| b.name == binding.name) {
            Some(existing) if replace => *existing = binding,
            Some(_) => {}
            None => self.bindings.push(binding),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    fixed: FixedBindings,
    precedence: BindingPrecedence,
}

impl Resolver {
    pub fn new(fixed: FixedBindings, precedence: BindingPrecedence) -> Self {
        Self { fixed, precedence }
    }

    /// Build the binding plan for `unit`: explicit imports in source order, then
    /// the fixed bindings under the configured precedence.
    pub fn resolve(
        &self,
        unit: &CodeUnit,
        dataset: &StagedDataset,
    ) -> Result<ExecutionContext, ExecutionError> {
        let mut ctx = ExecutionContext {
            bindings: Vec::new(),
            dataset: dataset.clone(),
            tabular_module: self.fixed.tabular_module.clone(),
        };

        for stmt in scan_imports(unit.code())? {
            let name = stmt.bound_name().to_string();
            let source = match stmt {
                ImportStmt::Module { path, .. } => BindingSource::Module { path },
                ImportStmt::From { module, name, .. } => BindingSource::Attribute {
                    module,
                    attribute: name,
                },
            };
            // A later import of the same name rebinds it, as in the language itself.
            ctx.bind(Binding { name, source }, true);
        }

        let replace = self.precedence == BindingPrecedence::FixedWins;
        for binding in self.fixed.bindings() {
            ctx.bind(binding, replace);
        }

        tracing::debug!(bindings = ctx.bindings.len(), "resolved execution context");
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::DatasetFormat, normalize::normalize};

    fn staged() -> StagedDataset {
        StagedDataset {
            path: "/tmp/cars.csv".into(),
            format: DatasetFormat::Csv,
        }
    }

    fn module(path: &str) -> BindingSource {
        BindingSource::Module { path: path.into() }
    }

    #[test]
    fn explicit_imports_then_fixed() {
        let unit = normalize("import altair as alt\nfrom math import pi\nimport os.path");
        let ctx = Resolver::default().resolve(&unit, &staged()).unwrap();
        let names: Vec<&str> = ctx.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["alt", "pi", "path", "pl", "data", "plt"]);
        assert_eq!(ctx.get("alt"), Some(&module("altair")));
        assert_eq!(
            ctx.get("pi"),
            Some(&BindingSource::Attribute {
                module: "math".into(),
                attribute: "pi".into()
            })
        );
        assert_eq!(ctx.get("path"), Some(&module("os.path")));
        assert_eq!(ctx.get("data"), Some(&BindingSource::Dataset));
        assert_eq!(ctx.tabular_module(), "polars");
    }

    #[test]
    fn fixed_bindings_win_collisions_by_default() {
        let unit = normalize("import pandas as pl\nimport numpy as data");
        let ctx = Resolver::default().resolve(&unit, &staged()).unwrap();
        assert_eq!(ctx.get("pl"), Some(&module("polars")));
        assert_eq!(ctx.get("data"), Some(&BindingSource::Dataset));
        assert_eq!(ctx.bindings().iter().filter(|b| b.name == "pl").count(), 1);
    }

    #[test]
    fn explicit_precedence_keeps_unit_imports() {
        let unit = normalize("import pandas as pl");
        let resolver = Resolver::new(FixedBindings::default(), BindingPrecedence::ExplicitWins);
        let ctx = resolver.resolve(&unit, &staged()).unwrap();
        assert_eq!(ctx.get("pl"), Some(&module("pandas")));
        assert_eq!(ctx.get("plt"), Some(&module("matplotlib.pyplot")));
    }

    #[test]
    fn later_explicit_import_rebinds() {
        let unit = normalize("import json as j\nimport pickle as j");
        let ctx = Resolver::default().resolve(&unit, &staged()).unwrap();
        assert_eq!(ctx.get("j"), Some(&module("pickle")));
    }

    #[test]
    fn inspection_errors_propagate() {
        for raw in ["import os\nfrom . import sibling", "import os\nfrom os import *"] {
            let unit = normalize(raw);
            let err = Resolver::default().resolve(&unit, &staged()).unwrap_err();
            assert_eq!(err.kind(), "syntax", "input: {raw:?}");
            assert!(err.trace().contains("from "), "trace: {:?}", err.trace());
        }
    }

    #[test]
    fn contexts_are_independent() {
        let resolver = Resolver::default();
        let a = resolver.resolve(&normalize("import json"), &staged()).unwrap();
        let b = resolver.resolve(&normalize("import csv"), &staged()).unwrap();
        assert!(a.get("csv").is_none());
        assert!(b.get("json").is_none());
    }
}
