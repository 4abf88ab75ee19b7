//! Portable outputs of a chart unit.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::error::ExecutionError;

/// Bytes escaped in a URL path segment: everything but RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reference to the externally hosted copy of the dataset, injected into specs
/// in place of the literal rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRef {
    pub url: String,
}

impl DatasetRef {
    /// `file_name` is a display name; each of its path segments is percent-encoded.
    pub fn new(prefix: &str, file_name: &str) -> Self {
        let path = file_name
            .trim_start_matches('/')
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            url: format!("{}/{}", prefix.trim_end_matches('/'), path),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "url": self.url })
    }
}

/// A declarative chart description with the embedded data replaced by a [`DatasetRef`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StructuredSpec(pub serde_json::Map<String, serde_json::Value>);

impl StructuredSpec {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RasterImage {
    /// Base64 text of the encoded image.
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// Decode and probe the image header; anything unreadable is a shape error.
    pub fn from_base64(text: &str) -> Result<Self, ExecutionError> {
        let text = text.trim();
        let head: String = text.chars().take(32).collect();
        let context = || format!("raster: {} base64 chars starting {head:?}", text.len());
        let bytes = STANDARD.decode(text).map_err(|e| {
            ExecutionError::shape(format!("raster is not valid base64: {e}")).with_trace(context())
        })?;
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| {
                ExecutionError::shape(format!("raster could not be read: {e}")).with_trace(context())
            })?
            .into_dimensions()
            .map_err(|e| {
                ExecutionError::shape(format!("raster is not a readable image: {e}"))
                    .with_trace(context())
            })?;
        Ok(Self {
            base64: text.to_string(),
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Spec(StructuredSpec),
    Raster(RasterImage),
    Absent,
}

impl Artifact {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_spec(&self) -> Option<&StructuredSpec> {
        match self {
            Self::Spec(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_raster(&self) -> Option<&RasterImage> {
        match self {
            Self::Raster(raster) => Some(raster),
            _ => None,
        }
    }
}
