//! The commodity page pipeline: load → filter → chart, plus the headless
//! thumbnail and summary helpers built on the same steps.

use crate::chart::{ChartSpec, build_chart};
use crate::commodity::{self, CommoditySchema};
use crate::filter::{FilteredView, Selections, filter};
use crate::loader::{LoadError, Loader};
use crate::models::GraphType;
use crate::viz::{self, Tile};
use anyhow::Result;
use log::{info, warn};

/// Shown when some kept value was blank or not a number.
pub const COERCION_WARNING: &str =
    "Some values in the 'Value' column could not be converted to numbers and are set as NaN.";

/// Shown instead of a chart when nothing matches.
pub const EMPTY_WARNING: &str = "No data available for the selected filters.";

/// Rows of the accuracy table; values are not computed yet.
pub const ACCURACY_METRICS: [&str; 7] = [
    "Next Month Model Accuracy",
    "3rd Month Model Accuracy",
    "6th Month Model Accuracy",
    "Seasonal Model Accuracy",
    "3 Month Average Accuracy",
    "6 Month Average Accuracy",
    "Next Month Directional Accuracy",
];

const METRIC_PLACEHOLDER: &str = "-- %";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

/// The accuracy table with every value still a placeholder.
pub fn accuracy_metrics() -> Vec<MetricRow> {
    ACCURACY_METRICS
        .iter()
        .map(|m| MetricRow {
            metric: m.to_string(),
            value: METRIC_PLACEHOLDER.to_string(),
        })
        .collect()
}

/// Markdown rendering of `rows`.
pub fn metrics_markdown(rows: &[MetricRow]) -> String {
    let mut out = String::from("| Metric | Value |\n|---|---|\n");
    for row in rows {
        out.push_str(&format!("| {} | {} |\n", row.metric, row.value));
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Chart(ChartSpec),
    /// Nothing to draw; show [`EMPTY_WARNING`].
    Empty,
}

impl ChartView {
    pub fn chart(&self) -> Option<&ChartSpec> {
        match self {
            ChartView::Chart(spec) => Some(spec),
            ChartView::Empty => None,
        }
    }
}

/// Everything a commodity page shows.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub title: String,
    /// User-facing notices, in display order.
    pub warnings: Vec<String>,
    pub view: ChartView,
    pub filtered: FilteredView,
    pub metrics: Vec<MetricRow>,
}

/// Run one commodity page for `selections`.
///
/// Only a failure to read the sheet is an error. Empty results and
/// non-numeric values surface as warnings.
pub fn run_page(
    loader: &Loader,
    schema: &CommoditySchema,
    selections: &Selections,
    show_legend: bool,
) -> Result<PageOutcome, LoadError> {
    let table = loader.load(schema.sheet)?;
    if table.dimension != schema.dimension {
        warn!(
            "{}: sheet {:?} dimension is {:?}, expected {:?}",
            schema.key, schema.sheet, table.dimension, schema.dimension
        );
    }
    if table.has_state != schema.has_state {
        warn!(
            "{}: sheet {:?} has_state is {}, expected {}",
            schema.key, schema.sheet, table.has_state, schema.has_state
        );
    }

    let filtered = filter(&table, selections);
    let mut warnings = Vec::new();
    if filtered.coercion_failed {
        warnings.push(COERCION_WARNING.to_string());
    }

    let view = if filtered.is_empty() {
        ChartView::Empty
    } else {
        let graph_types: Vec<GraphType> = selections.graph_types.iter().copied().collect();
        let spec = build_chart(schema, &graph_types, &filtered.table, show_legend);
        if spec.is_empty() {
            ChartView::Empty
        } else {
            ChartView::Chart(spec)
        }
    };
    if matches!(view, ChartView::Empty) {
        warnings.push(EMPTY_WARNING.to_string());
    }

    Ok(PageOutcome {
        title: schema.page_title(),
        warnings,
        view,
        filtered,
        metrics: accuracy_metrics(),
    })
}

/// Chart for the commodity's export defaults with the legend hidden, or
/// `None` when those defaults match nothing.
pub fn default_chart(loader: &Loader, schema: &CommoditySchema) -> Result<Option<ChartSpec>> {
    let outcome = run_page(loader, schema, &schema.export_defaults(), false)?;
    Ok(match outcome.view {
        ChartView::Chart(spec) => Some(spec),
        ChartView::Empty => None,
    })
}

/// PNG bytes of the default chart, independent of any interactive selection.
pub fn export_thumbnail(
    loader: &Loader,
    schema: &CommoditySchema,
    width: u32,
    height: u32,
) -> Result<Option<Vec<u8>>> {
    match default_chart(loader, schema)? {
        Some(spec) => Ok(Some(viz::export_image(&spec, width, height)?)),
        None => {
            info!("{}: default selection is empty, no thumbnail", schema.key);
            Ok(None)
        }
    }
}

/// One tile per registered summary commodity, captioned with its upper-cased
/// name. A commodity whose sheet is absent from the workbook gets an empty
/// tile; any other load failure is returned.
pub fn summary_tiles(loader: &Loader) -> Result<Vec<Tile>> {
    let mut tiles = Vec::new();
    for schema in commodity::summary_commodities() {
        let chart = match default_chart(loader, schema) {
            Ok(chart) => chart,
            Err(err) => match err.downcast_ref::<LoadError>() {
                Some(LoadError::MissingSheet { .. }) => {
                    warn!("{}: {err}", schema.key);
                    None
                }
                _ => return Err(err),
            },
        };
        tiles.push(Tile::new(schema.name.to_uppercase(), chart));
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_placeholders() {
        let rows = accuracy_metrics();
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|r| r.value == "-- %"));
        assert_eq!(rows[6].metric, "Next Month Directional Accuracy");
    }

    #[test]
    fn metrics_render_as_markdown() {
        let md = metrics_markdown(&accuracy_metrics());
        assert!(md.starts_with("| Metric | Value |\n|---|---|\n"));
        assert!(md.contains("| Seasonal Model Accuracy | -- % |\n"));
        assert_eq!(md.lines().count(), 9);
    }

    #[test]
    fn missing_sheet_propagates_from_run_page() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::open(dir.path());
        let err = run_page(
            &loader,
            &commodity::WHEAT,
            &commodity::WHEAT.export_defaults(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingSheet { .. }));
    }

    #[test]
    fn summary_skips_missing_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::open(dir.path());
        let tiles = summary_tiles(&loader).unwrap();
        let captions: Vec<&str> = tiles.iter().map(|t| t.caption.as_str()).collect();
        assert_eq!(captions, ["WHEAT", "SHRIMP", "CHANA"]);
        assert!(tiles.iter().all(|t| t.chart.is_none()));
    }
}
