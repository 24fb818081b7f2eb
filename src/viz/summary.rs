//! Overview grid: one tile per commodity, three tiles per row.

use super::text::truncate_to_width;
use super::types::ImageFormat;
use super::{draw_chart, ensure_fonts_registered};
use crate::chart::ChartSpec;
use anyhow::{Result, anyhow, bail};
use log::info;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

pub const SUMMARY_COLUMNS: usize = 3;

/// Shown in tiles whose commodity has nothing to chart.
pub const NO_DATA_TEXT: &str = "No data available";

/// One grid cell.
#[derive(Debug, Clone)]
pub struct Tile {
    pub caption: String,
    /// `None` renders the no-data placeholder.
    pub chart: Option<ChartSpec>,
}

impl Tile {
    pub fn new(caption: impl Into<String>, chart: Option<ChartSpec>) -> Self {
        Self {
            caption: caption.into(),
            chart,
        }
    }
}

/// Grid dimensions `(rows, cols)` for `n` tiles.
pub fn grid_shape(n: usize) -> (usize, usize) {
    let cols = n.clamp(1, SUMMARY_COLUMNS);
    (n.div_ceil(SUMMARY_COLUMNS).max(1), cols)
}

/// Render `tiles` row by row into one image of `tile_width x tile_height`
/// cells. Format follows the extension as in [`super::render_to_file`].
pub fn render_summary<P: AsRef<Path>>(
    tiles: &[Tile],
    out_path: P,
    tile_width: u32,
    tile_height: u32,
) -> Result<()> {
    if tiles.is_empty() {
        bail!("no tiles to render");
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let (rows, cols) = grid_shape(tiles.len());
    let grid_px = |tile: u32, n: usize| u32::try_from(n).ok().and_then(|n| tile.checked_mul(n));
    let size = match (grid_px(tile_width, cols), grid_px(tile_height, rows)) {
        (Some(w), Some(h)) => (w, h),
        _ => bail!("summary of {rows}x{cols} tiles at {tile_width}x{tile_height} px is too large"),
    };

    match ImageFormat::from_path(out_path) {
        ImageFormat::Svg => {
            let root = SVGBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_tiles(&root, tiles, rows, cols)?;
            root.present().map_err(|e| anyhow!("{:?}", e))?;
        }
        ImageFormat::Png => {
            let root = BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
            draw_tiles(&root, tiles, rows, cols)?;
            root.present().map_err(|e| anyhow!("{:?}", e))?;
        }
    }
    info!("rendered {} summary tiles to {}", tiles.len(), out_path.display());
    Ok(())
}

fn draw_tiles<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    tiles: &[Tile],
    rows: usize,
    cols: usize,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let cells = root.split_evenly((rows, cols));
    for (cell, tile) in cells.iter().zip(tiles) {
        let (w, h) = cell.dim_in_pixel();
        cell.draw(&Rectangle::new(
            [(0, 0), (w as i32 - 1, h as i32 - 1)],
            BLACK.mix(0.2).stroke_width(1),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;

        let caption = truncate_to_width(&tile.caption, 18, w.saturating_sub(16));
        let inner = cell
            .titled(&caption, (FontFamily::SansSerif, 18))
            .map_err(|e| anyhow!("{:?}", e))?;
        match &tile.chart {
            Some(spec) if !spec.is_empty() => draw_chart(&inner, spec, 13)?,
            _ => {
                inner
                    .draw(&Text::new(
                        NO_DATA_TEXT,
                        (12, 12),
                        (FontFamily::SansSerif, 14).into_font().color(&RGBColor(110, 110, 110)),
                    ))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_columns() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(3), (1, 3));
        assert_eq!(grid_shape(4), (2, 3));
        assert_eq!(grid_shape(9), (3, 3));
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tiles = vec![Tile::new("WHEAT", None); 3];
        let path = dir.path().join("s.png");
        let err = render_summary(&tiles, &path, u32::MAX / 2, 100).unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
        assert!(!path.exists());
    }

    #[test]
    fn empty_grid_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_summary(&[], dir.path().join("s.png"), 100, 100).is_err());
    }
}
