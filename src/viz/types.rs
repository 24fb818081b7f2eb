//! Public types for the visualization module.

use std::path::Path;

/// Output encodings supported by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Scalable vector output (`.svg`).
    Svg,
    /// Raster output; used for every other extension.
    Png,
}

impl ImageFormat {
    /// Pick the format from the file extension (case-insensitive). Anything
    /// that is not `.svg` renders as PNG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageFormat::Svg,
            _ => ImageFormat::Png,
        }
    }
}
