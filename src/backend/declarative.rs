//! Spec-producing libraries: the chart object converts itself to a JSON mapping.

use super::{json_outline, unexpected, ExportMode, Extracted, Library, RenderBackend, ResultValue};
use crate::{
    artifact::{Artifact, DatasetRef, StructuredSpec},
    error::ExecutionError,
};

/// Top-level keys that carry literal rows and are replaced by a [`DatasetRef`].
const EMBEDDED_DATA_KEYS: &[&str] = &["data", "datasets"];

#[derive(Debug, Clone)]
pub struct DeclarativeSpecBackend {
    library: Library,
}

impl DeclarativeSpecBackend {
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

impl RenderBackend for DeclarativeSpecBackend {
    fn library(&self) -> Library {
        self.library
    }

    fn export_mode(&self) -> ExportMode {
        ExportMode::Spec
    }

    fn extract(&self, value: ResultValue, dataset: &DatasetRef) -> Result<Extracted, ExecutionError> {
        let spec = match value {
            ResultValue::Spec { spec } => spec,
            other => return Err(unexpected("a chart spec", &other)),
        };
        let mut map = match spec {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(ExecutionError::shape("chart spec is not a JSON object")
                    .with_trace(format!("spec: {}", json_outline(&other))))
            }
        };
        for key in EMBEDDED_DATA_KEYS {
            map.remove(*key);
        }
        map.insert("data".to_string(), dataset.to_value());
        Ok(Artifact::Spec(StructuredSpec(map)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> DatasetRef {
        DatasetRef::new("/files/data", "cars.csv")
    }

    #[test]
    fn strips_literal_rows_and_injects_reference() {
        let spec = json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "mark": "bar",
            "data": {"name": "data-1a2b"},
            "datasets": {"data-1a2b": [{"hp": 130, "mpg": 18}, {"hp": 165, "mpg": 15}]},
            "encoding": {"x": {"field": "hp", "type": "quantitative"}}
        });
        let out = DeclarativeSpecBackend::new(Library::Altair)
            .extract(ResultValue::Spec { spec }, &dataset())
            .unwrap();
        let spec = out.artifact.as_spec().unwrap();
        assert_eq!(spec.get("data"), Some(&json!({"url": "/files/data/cars.csv"})));
        assert!(spec.get("datasets").is_none());
        assert_eq!(spec.get("mark"), Some(&json!("bar")));
        let text = serde_json::to_string(spec).unwrap();
        assert!(!text.contains("130"));
        assert!(out.table.is_none());
    }

    #[test]
    fn inline_values_are_replaced_too() {
        let spec = json!({"mark": "point", "data": {"values": [{"a": 1}]}});
        let out = DeclarativeSpecBackend::new(Library::Altair)
            .extract(ResultValue::Spec { spec }, &dataset())
            .unwrap();
        assert_eq!(
            out.artifact.as_spec().unwrap().get("data"),
            Some(&json!({"url": "/files/data/cars.csv"}))
        );
    }

    #[test]
    fn wrong_shapes_are_shape_errors() {
        let backend = DeclarativeSpecBackend::new(Library::Altair);
        let err = backend
            .extract(ResultValue::Spec { spec: json!([1, 2]) }, &dataset())
            .unwrap_err();
        assert_eq!(err.kind(), "artifact_shape");
        assert_eq!(err.trace(), "spec: array of 2");

        let err = backend
            .extract(
                ResultValue::Raster {
                    image: String::new(),
                    table: None,
                    columns: None,
                },
                &dataset(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "artifact_shape");
    }
}
