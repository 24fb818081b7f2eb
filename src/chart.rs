//! Chart construction: filtered rows → renderer-independent [`ChartSpec`].
//!
//! - Arrival groups become semi-transparent bars on the secondary axis
//! - Price groups become lines on the primary axis, forecast runs dashed and
//!   drawn first, "Actual" solid and drawn last so it stays on top
//! - Colors come from a fixed palette by group ordinal (sorted group keys)
//!
//! A chart serializes to a Plotly-compatible `{data, layout}` document via
//! [`ChartSpec::to_plotly_json`].

use crate::commodity::CommoditySchema;
use crate::models::{GraphType, Month, SeriesKey, Table};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Opacity of arrival bars.
pub const BAR_OPACITY: f64 = 0.4;

/// 8-bit RGB color; written to chart documents as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Plotly's default qualitative palette.
pub const PALETTE: [Rgb8; 10] = [
    Rgb8::new(0x63, 0x6E, 0xFA), // blue
    Rgb8::new(0xEF, 0x55, 0x3B), // red
    Rgb8::new(0x00, 0xCC, 0x96), // green
    Rgb8::new(0xAB, 0x63, 0xFA), // purple
    Rgb8::new(0xFF, 0xA1, 0x5A), // orange
    Rgb8::new(0x19, 0xD3, 0xF3), // cyan
    Rgb8::new(0xFF, 0x66, 0x92), // pink
    Rgb8::new(0xB6, 0xE8, 0x80), // light green
    Rgb8::new(0xFF, 0x97, 0xFF), // light pink
    Rgb8::new(0xFE, 0xCB, 0x52), // yellow
];

/// Palette color for a group ordinal.
#[inline]
pub fn palette_color(ordinal: usize) -> Rgb8 {
    PALETTE[ordinal % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    Solid,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesKind {
    Bar { opacity: f64 },
    Line { dash: LineDash },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRef {
    Primary,
    Secondary,
}

/// Where a point's value label sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    /// Above the end of a bar.
    Outside,
    /// Centered above a marker.
    TopCenter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub month: Month,
    pub value: Option<f64>,
}

impl SeriesPoint {
    /// Integer-rounded value text; `None` for gaps.
    pub fn label(&self) -> Option<String> {
        self.value.map(|v| format!("{v:.0}"))
    }
}

/// One drawable series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub graph_type: GraphType,
    pub key: SeriesKey,
    pub kind: SeriesKind,
    pub axis: AxisRef,
    pub color: Rgb8,
    pub label_position: LabelPosition,
    /// Sorted by fiscal month.
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn dash(&self) -> Option<LineDash> {
        match self.kind {
            SeriesKind::Line { dash } => Some(dash),
            SeriesKind::Bar { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAxis {
    pub title: String,
    pub categories: Vec<Month>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueAxis {
    pub title: String,
    /// Drawn on the right and sharing the plot area with the primary axis.
    pub overlaying: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Legend {
    /// Anchor as a fraction of the plot area, from the left.
    pub x: f64,
    /// Anchor as a fraction of the plot area, from the bottom.
    pub y: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: CategoryAxis,
    pub y_axis: ValueAxis,
    pub y2_axis: Option<ValueAxis>,
    pub legend: Legend,
    /// In draw order.
    pub series: Vec<Series>,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Plotly `{data, layout}` document.
    pub fn to_plotly_json(&self) -> Value {
        let data: Vec<Value> = self
            .series
            .iter()
            .map(|s| {
                let x: Vec<&str> = s.points.iter().map(|p| p.month.as_str()).collect();
                let y: Vec<Option<f64>> = s.points.iter().map(|p| p.value).collect();
                let yaxis = match s.axis {
                    AxisRef::Primary => "y",
                    AxisRef::Secondary => "y2",
                };
                let textposition = match s.label_position {
                    LabelPosition::Outside => "outside",
                    LabelPosition::TopCenter => "top center",
                };
                match s.kind {
                    SeriesKind::Bar { opacity } => json!({
                        "type": "bar",
                        "name": s.name,
                        "x": x,
                        "y": y,
                        "yaxis": yaxis,
                        "opacity": opacity,
                        "marker": { "color": s.color.hex() },
                        "text": y,
                        "textposition": textposition,
                        "texttemplate": "%{text:.0f}",
                    }),
                    SeriesKind::Line { dash } => {
                        let dash = match dash {
                            LineDash::Solid => "solid",
                            LineDash::Dash => "dash",
                        };
                        json!({
                            "type": "scatter",
                            "mode": "lines+markers+text",
                            "name": s.name,
                            "x": x,
                            "y": y,
                            "yaxis": yaxis,
                            "marker": { "color": s.color.hex() },
                            "line": { "color": s.color.hex(), "dash": dash },
                            "text": y,
                            "textposition": textposition,
                            "texttemplate": "%{text:.0f}",
                        })
                    }
                }
            })
            .collect();

        let months: Vec<&str> = self.x_axis.categories.iter().map(|m| m.as_str()).collect();
        let mut layout = json!({
            "title": self.title,
            "xaxis": {
                "title": self.x_axis.title,
                "categoryorder": "array",
                "categoryarray": months,
            },
            "yaxis": { "title": self.y_axis.title, "side": "left" },
            "legend": { "x": self.legend.x, "y": self.legend.y },
            "showlegend": self.legend.visible,
        });
        if let Some(y2) = &self.y2_axis {
            layout["yaxis2"] = json!({ "title": y2.title, "overlaying": "y", "side": "right" });
            layout["barmode"] = json!("group");
        }
        json!({ "data": data, "layout": layout })
    }
}

/// Group rows of `graph_type` by series key; keys come back sorted and each
/// group's points sorted by fiscal month.
pub fn group_series(table: &Table, graph_type: GraphType) -> BTreeMap<SeriesKey, Vec<SeriesPoint>> {
    let mut groups: BTreeMap<SeriesKey, Vec<SeriesPoint>> = BTreeMap::new();
    for obs in table.rows.iter().filter(|o| o.graph_type == graph_type) {
        groups.entry(obs.series_key()).or_default().push(SeriesPoint {
            month: obs.month,
            value: obs.value.as_number(),
        });
    }
    for points in groups.values_mut() {
        points.sort_by_key(|p| p.month);
    }
    groups
}

/// Build the dual-axis chart for `schema` from an already filtered table.
///
/// Graph types the commodity does not chart are ignored. An empty result
/// (`spec.is_empty()`) is not an error; callers show an empty state instead.
pub fn build_chart(
    schema: &CommoditySchema,
    graph_types: &[GraphType],
    table: &Table,
    show_legend: bool,
) -> ChartSpec {
    let wants = |t: GraphType| graph_types.contains(&t) && schema.chartable(t);
    let mut series = Vec::new();

    // Bars first so every line draws over them.
    if wants(GraphType::Arrival) {
        for (ordinal, (key, points)) in group_series(table, GraphType::Arrival)
            .into_iter()
            .enumerate()
        {
            series.push(Series {
                name: key.label(GraphType::Arrival),
                graph_type: GraphType::Arrival,
                key,
                kind: SeriesKind::Bar {
                    opacity: BAR_OPACITY,
                },
                axis: AxisRef::Secondary,
                color: palette_color(ordinal),
                label_position: LabelPosition::Outside,
                points,
            });
        }
    }

    if wants(GraphType::Price) {
        // Ordinals are taken over the full sorted list, before the split.
        let (actual, predicted): (Vec<_>, Vec<_>) = group_series(table, GraphType::Price)
            .into_iter()
            .enumerate()
            .partition(|(_, (key, _))| key.is_actual());

        for (ordinal, (key, points)) in predicted.into_iter().chain(actual) {
            let dash = if key.is_actual() {
                LineDash::Solid
            } else {
                LineDash::Dash
            };
            series.push(Series {
                name: key.label(GraphType::Price),
                graph_type: GraphType::Price,
                key,
                kind: SeriesKind::Line { dash },
                axis: AxisRef::Primary,
                color: palette_color(ordinal),
                label_position: LabelPosition::TopCenter,
                points,
            });
        }
    }

    ChartSpec {
        title: schema.chart_title(),
        x_axis: CategoryAxis {
            title: "Month".into(),
            categories: Month::ALL.to_vec(),
        },
        y_axis: ValueAxis {
            title: "Price".into(),
            overlaying: false,
        },
        y2_axis: wants(GraphType::Arrival).then(|| ValueAxis {
            title: "Arrival".into(),
            overlaying: true,
        }),
        legend: Legend {
            x: 0.01,
            y: 0.99,
            visible: show_legend,
        },
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps() {
        assert_eq!(palette_color(0), palette_color(10));
        assert_eq!(palette_color(3).hex(), "#AB63FA");
    }

    #[test]
    fn point_labels_round() {
        let p = SeriesPoint {
            month: Month::Apr,
            value: Some(2149.6),
        };
        assert_eq!(p.label().as_deref(), Some("2150"));
        let gap = SeriesPoint {
            month: Month::May,
            value: None,
        };
        assert_eq!(gap.label(), None);
    }

    #[test]
    fn color_hex_is_upper_case() {
        assert_eq!(Rgb8::new(255, 0, 16).hex(), "#FF0010");
    }
}
