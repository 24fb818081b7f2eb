//! Visualization module: renders a [`ChartSpec`] with Plotters.
//!
//! Organization:
//! - `types`: output format selection
//! - `text`: text measuring and truncation helpers
//! - `util`: color conversion, axis ranges, tick labels
//! - `summary`: the overview grid of commodity thumbnails
//!
//! Charts share one category X axis (the twelve fiscal months at positions
//! `0..12`). Line series and bars can sit on either the primary (left) or
//! the secondary (right) value axis; bars of the same month are offset so
//! they do not overlap.

pub mod summary;
pub mod text;
pub mod types;
pub mod util;

pub use summary::{Tile, render_summary};
pub use types::ImageFormat;

use crate::chart::{AxisRef, ChartSpec, LineDash, SeriesKind, SeriesPoint};
use anyhow::{Context, Result, anyhow};
use image::{ImageBuffer, RgbImage};
use log::info;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{DashedLineSeries, LineSeries};
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::io::Cursor;
use std::path::Path;
use std::sync::Once;

use text::truncate_to_width;
use util::{compute_label_area_px, format_value_tick, month_tick, to_plotters, value_range};

const MARGIN: u32 = 16;
const X_RANGE: std::ops::Range<f64> = -0.5..11.5;
const Y_LABELS: usize = 8;
/// Share of a month slot covered by its bars.
const GROUP_WIDTH: f64 = 0.8;

static INIT_FONTS: Once = Once::new();

pub(crate) fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        // From `src/viz/mod.rs` to `assets/DejaVuSans.ttf` at the project root.
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Render `spec` to `out_path`. The file extension picks the encoding:
/// `.svg` writes SVG, anything else PNG.
///
/// Fails for a spec without series; callers render an empty state instead.
pub fn render_to_file<P: AsRef<Path>>(
    spec: &ChartSpec,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if spec.is_empty() {
        return Err(anyhow!("no series to plot"));
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    match ImageFormat::from_path(out_path) {
        ImageFormat::Svg => {
            let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_chart(&root, spec, 22)?;
            root.present().map_err(|e| anyhow!("{:?}", e))?;
        }
        ImageFormat::Png => {
            let root =
                BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_chart(&root, spec, 22)?;
            root.present().map_err(|e| anyhow!("{:?}", e))?;
        }
    }
    info!(
        "rendered {:?} ({} series) to {}",
        spec.title,
        spec.series.len(),
        out_path.display()
    );
    Ok(())
}

/// Render `spec` to an in-memory SVG document.
pub fn render_svg_string(spec: &ChartSpec, width: u32, height: u32) -> Result<String> {
    if spec.is_empty() {
        return Err(anyhow!("no series to plot"));
    }
    ensure_fonts_registered();
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        draw_chart(&root, spec, 22)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(buf)
}

/// Render `spec` to PNG bytes, e.g. for a thumbnail. Nothing touches the
/// filesystem.
pub fn export_image(spec: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
    if spec.is_empty() {
        return Err(anyhow!("no series to plot"));
    }
    ensure_fonts_registered();
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .ok_or_else(|| anyhow!("image of {width}x{height} px is too large"))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, spec, 22)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }

    let img: RgbImage = ImageBuffer::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("pixel buffer does not match {width}x{height}"))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .context("encoding PNG")?;
    Ok(png)
}

/// Draw a whole chart (caption, both axes, series, legend) into `area`.
pub(crate) fn draw_chart<DB>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    caption_px: u32,
) -> Result<()>
where
    DB: DrawingBackend,
{
    area.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let (y_min, y_max) = value_range(spec, AxisRef::Primary);
    let (y2_min, y2_max) = value_range(spec, AxisRef::Secondary);
    let (area_w, _) = area.dim_in_pixel();

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(MARGIN)
        .caption(
            truncate_to_width(&spec.title, caption_px, area_w.saturating_sub(2 * MARGIN)),
            (FontFamily::SansSerif, caption_px),
        )
        .set_label_area_size(
            LabelAreaPosition::Left,
            compute_label_area_px(y_min, y_max, Y_LABELS, 12),
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 48);
    if spec.y2_axis.is_some() {
        builder.set_label_area_size(
            LabelAreaPosition::Right,
            compute_label_area_px(y2_min, y2_max, Y_LABELS, 12),
        );
    }
    let mut chart = builder
        .build_cartesian_2d(X_RANGE, y_min..y_max)
        .map_err(|e| anyhow!("{:?}", e))?
        .set_secondary_coord(X_RANGE, y2_min..y2_max);

    let x_label_fmt = |x: &f64| month_tick(*x);
    let y_label_fmt = |v: &f64| format_value_tick(*v);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_axis.title.as_str())
        .y_desc(spec.y_axis.title.as_str())
        .x_labels(spec.x_axis.categories.len().max(1))
        .y_labels(Y_LABELS)
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 14))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    if let Some(y2) = &spec.y2_axis {
        chart
            .configure_secondary_axes()
            .y_desc(y2.title.as_str())
            .y_labels(Y_LABELS)
            .y_label_formatter(&y_label_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 14))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    // Same call on whichever axis the series is bound to.
    macro_rules! draw_on {
        ($axis:expr, $elements:expr) => {
            (match $axis {
                AxisRef::Primary => chart.draw_series($elements),
                AxisRef::Secondary => chart.draw_secondary_series($elements),
            })
            .map_err(|e| anyhow!("{:?}", e))?
        };
    }

    let value_style = TextStyle::from((FontFamily::SansSerif, 11))
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let legend_px = (area_w as f32 * 0.45) as u32;

    let bar_count = spec
        .series
        .iter()
        .filter(|s| matches!(s.kind, SeriesKind::Bar { .. }))
        .count()
        .max(1);
    let bar_w = GROUP_WIDTH / bar_count as f64;
    let mut bar_slot = 0usize;

    for s in &spec.series {
        let color = to_plotters(s.color);
        let name = truncate_to_width(&s.name, 12, legend_px);
        match s.kind {
            SeriesKind::Bar { opacity } => {
                let fill = color.mix(opacity);
                let x_off = -GROUP_WIDTH / 2.0 + bar_slot as f64 * bar_w;
                bar_slot += 1;

                let rects: Vec<Rectangle<(f64, f64)>> = s
                    .points
                    .iter()
                    .filter_map(|p| {
                        let v = p.value?;
                        let x0 = p.month.index() as f64 + x_off;
                        Some(Rectangle::new(
                            [(x0, v.min(0.0)), (x0 + bar_w, v.max(0.0))],
                            fill.filled(),
                        ))
                    })
                    .collect();
                let anno = draw_on!(s.axis, rects);
                anno.label(name).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 16, y + 5)], fill.filled())
                });

                let labels: Vec<_> = s
                    .points
                    .iter()
                    .filter_map(|p| {
                        let (v, text) = p.value.zip(p.label())?;
                        let x = p.month.index() as f64 + x_off + bar_w / 2.0;
                        Some(
                            EmptyElement::at((x, v.max(0.0)))
                                + Text::new(text, (0, -3), value_style.clone()),
                        )
                    })
                    .collect();
                draw_on!(s.axis, labels);
            }
            SeriesKind::Line { dash } => {
                for run in segments(&s.points) {
                    match dash {
                        LineDash::Solid => {
                            draw_on!(s.axis, LineSeries::new(run, color.stroke_width(2)));
                        }
                        LineDash::Dash => {
                            draw_on!(
                                s.axis,
                                DashedLineSeries::new(run, 8, 5, color.stroke_width(2))
                            );
                        }
                    }
                }

                let markers: Vec<_> = s
                    .points
                    .iter()
                    .filter_map(|p| {
                        let (v, text) = p.value.zip(p.label())?;
                        Some(
                            EmptyElement::at((p.month.index() as f64, v))
                                + Circle::new((0, 0), 3, color.filled())
                                + Text::new(text, (0, -6), value_style.clone()),
                        )
                    })
                    .collect();
                // Carries the legend entry, so series with no drawable run still get one.
                let anno = draw_on!(s.axis, markers);
                match dash {
                    LineDash::Solid => {
                        anno.label(name).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                        });
                    }
                    LineDash::Dash => {
                        anno.label(name).legend(move |(x, y)| {
                            EmptyElement::at((x, y))
                                + PathElement::new(vec![(0, 0), (7, 0)], color.stroke_width(2))
                                + PathElement::new(vec![(11, 0), (18, 0)], color.stroke_width(2))
                        });
                    }
                }
            }
        }
    }

    if spec.legend.visible {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .border_style(BLACK)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 12))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Split a line into runs of consecutive present values; a missing month
/// breaks the line.
fn segments(points: &[SeriesPoint]) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut last_month: Option<usize> = None;
    for p in points {
        let idx = p.month.index();
        match p.value {
            Some(v) => {
                if last_month.is_some_and(|m| idx != m + 1) && !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                current.push((idx as f64, v));
                last_month = Some(idx);
            }
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                last_month = None;
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Month;

    fn point(month: Month, value: Option<f64>) -> SeriesPoint {
        SeriesPoint { month, value }
    }

    #[test]
    fn gaps_split_lines() {
        let pts = [
            point(Month::Apr, Some(1.0)),
            point(Month::May, None),
            point(Month::Jun, Some(3.0)),
            point(Month::Jul, Some(4.0)),
        ];
        let runs = segments(&pts);
        assert_eq!(runs, vec![vec![(0.0, 1.0)], vec![(2.0, 3.0), (3.0, 4.0)]]);
    }

    #[test]
    fn absent_months_split_lines() {
        let pts = [point(Month::Apr, Some(1.0)), point(Month::Jul, Some(4.0))];
        assert_eq!(segments(&pts).len(), 2);
    }
}
