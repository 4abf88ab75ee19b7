//! Imperative libraries: the result is a drawable surface rasterized by the interpreter.

use super::{
    unexpected, ExportMode, Extracted, FigureSerializer, Library, RenderBackend, ResultValue,
};
use crate::{
    artifact::{Artifact, DatasetRef, RasterImage},
    error::ExecutionError,
};

/// `(surface, table, columns)` results. The interpreter hides the frame and adds a
/// light dashed grid before saving; table and columns are passed through.
#[derive(Debug, Clone)]
pub struct FigureAxesBackend {
    library: Library,
    plot_module: String,
    dpi: u32,
}

impl FigureAxesBackend {
    pub fn new(library: Library, plot_module: impl Into<String>, dpi: u32) -> Self {
        Self {
            library,
            plot_module: plot_module.into(),
            dpi,
        }
    }
}

impl RenderBackend for FigureAxesBackend {
    fn library(&self) -> Library {
        self.library
    }

    fn export_mode(&self) -> ExportMode {
        ExportMode::FigureAxes {
            plot_module: self.plot_module.clone(),
            dpi: self.dpi,
        }
    }

    fn extract(&self, value: ResultValue, _dataset: &DatasetRef) -> Result<Extracted, ExecutionError> {
        match value {
            ResultValue::Raster {
                image,
                table,
                columns,
            } => Ok(Extracted {
                artifact: Artifact::Raster(RasterImage::from_base64(&image)?),
                table,
                columns,
            }),
            other => Err(unexpected("a rendered figure", &other)),
        }
    }
}

/// Single savable surface, serialized as-is.
#[derive(Debug, Clone)]
pub struct FigureOnlyBackend {
    library: Library,
}

impl FigureOnlyBackend {
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

impl RenderBackend for FigureOnlyBackend {
    fn library(&self) -> Library {
        self.library
    }

    fn export_mode(&self) -> ExportMode {
        let serializer = match self.library {
            Library::Plotly => FigureSerializer::PlotlyImage,
            _ => FigureSerializer::SaveMethod,
        };
        ExportMode::Figure { serializer }
    }

    fn extract(&self, value: ResultValue, _dataset: &DatasetRef) -> Result<Extracted, ExecutionError> {
        match value {
            ResultValue::Raster { image, .. } => {
                Ok(Artifact::Raster(RasterImage::from_base64(&image)?).into())
            }
            other => Err(unexpected("a rendered figure", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::tests::PIXEL_PNG;
    use serde_json::json;

    fn dataset() -> DatasetRef {
        DatasetRef::new("/files/data", "cars.csv")
    }

    #[test]
    fn figure_axes_passes_table_and_columns_through() {
        let backend = FigureAxesBackend::new(Library::Seaborn, "matplotlib.pyplot", 100);
        let table = json!([{"origin": "USA", "mpg": 20.1}]);
        let columns = json!({"x": "origin", "y": "mpg"});
        let out = backend
            .extract(
                ResultValue::Raster {
                    image: PIXEL_PNG.into(),
                    table: Some(table.clone()),
                    columns: Some(columns.clone()),
                },
                &dataset(),
            )
            .unwrap();
        assert_eq!(out.artifact.as_raster().unwrap().width, 1);
        assert_eq!(out.table, Some(table));
        assert_eq!(out.columns, Some(columns));
    }

    #[test]
    fn figure_only_serializer_depends_on_library() {
        assert_eq!(
            FigureOnlyBackend::new(Library::Ggplot).export_mode(),
            ExportMode::Figure {
                serializer: FigureSerializer::SaveMethod
            }
        );
        assert_eq!(
            FigureOnlyBackend::new(Library::Plotly).export_mode(),
            ExportMode::Figure {
                serializer: FigureSerializer::PlotlyImage
            }
        );
    }

    #[test]
    fn wrong_shapes_are_shape_errors() {
        let spec = || ResultValue::Spec { spec: json!({"mark": "bar"}) };
        let garbage = || ResultValue::Raster {
            image: "AAAA".into(),
            table: None,
            columns: None,
        };
        let axes = FigureAxesBackend::new(Library::Matplotlib, "matplotlib.pyplot", 100);
        let only = FigureOnlyBackend::new(Library::Ggplot);
        for err in [
            axes.extract(spec(), &dataset()).unwrap_err(),
            axes.extract(garbage(), &dataset()).unwrap_err(),
            only.extract(spec(), &dataset()).unwrap_err(),
            only.extract(garbage(), &dataset()).unwrap_err(),
        ] {
            assert_eq!(err.kind(), "artifact_shape");
        }
    }
}
