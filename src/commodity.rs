//! Per-commodity schema descriptors.
//!
//! One descriptor replaces a hand-written page per crop: it names the sheet,
//! says which optional columns apply, and carries the default selections for
//! the interactive page and for headless thumbnails.

use crate::config;
use crate::filter::Selections;
use crate::models::{ACTUAL_MODEL, DimensionKind, GraphType};
use log::warn;

/// Which forecast run a default selection shows next to "Actual".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelDefault {
    /// Whatever [`config::latest_model_run`] says at call time.
    LatestRun,
    /// A fixed run label.
    Fixed(&'static str),
}

impl ModelDefault {
    pub fn resolve(self) -> String {
        match self {
            ModelDefault::LatestRun => config::latest_model_run(),
            ModelDefault::Fixed(label) => label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultSelections {
    pub graph_types: &'static [GraphType],
    pub financial_years: &'static [&'static str],
    pub model: ModelDefault,
    pub dimensions: Option<&'static [&'static str]>,
    pub states: Option<&'static [&'static str]>,
}

impl DefaultSelections {
    pub fn resolve(&self) -> Selections {
        Selections {
            graph_types: self.graph_types.iter().copied().collect(),
            financial_years: self.financial_years.iter().map(|s| s.to_string()).collect(),
            models: [ACTUAL_MODEL.to_string(), self.model.resolve()]
                .into_iter()
                .collect(),
            dimensions: self
                .dimensions
                .map(|d| d.iter().map(|s| s.to_string()).collect()),
            states: self.states.map(|s| s.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommoditySchema {
    /// Lower-case identifier used on the command line and in the summary.
    pub key: &'static str,
    /// Display name used in titles.
    pub name: &'static str,
    pub sheet: &'static str,
    pub dimension: Option<DimensionKind>,
    pub has_state: bool,
    /// Price-only commodities never draw arrival bars.
    pub supports_arrivals: bool,
    pub interactive: DefaultSelections,
    pub export: DefaultSelections,
}

impl CommoditySchema {
    /// Heading of the interactive page.
    pub fn page_title(&self) -> String {
        if self.supports_arrivals {
            format!("{} Price and Arrival Trend", self.name)
        } else {
            format!("{} Price Trend", self.name)
        }
    }

    /// Title drawn on the chart itself.
    pub fn chart_title(&self) -> String {
        format!("Monthly {}", self.page_title())
    }

    /// Whether this commodity charts `requested` at all.
    pub fn chartable(&self, requested: GraphType) -> bool {
        requested == GraphType::Price || self.supports_arrivals
    }

    /// Starting selection for the interactive page.
    pub fn interactive_defaults(&self) -> Selections {
        if let ModelDefault::Fixed(label) = self.interactive.model {
            let latest = config::latest_model_run();
            if label != latest {
                warn!(
                    "{}: interactive default model {label:?} differs from latest model run {latest:?}",
                    self.key
                );
            }
        }
        self.interactive.resolve()
    }

    /// Selection used for thumbnails, independent of any interactive state.
    pub fn export_defaults(&self) -> Selections {
        self.export.resolve()
    }
}

const FY_SHORT: &[&str] = &["2025-26", "2024-25"];
const MADHYA_PRADESH: &[&str] = &["Madhya Pradesh"];
const PRICE_AND_ARRIVAL: &[GraphType] = &[GraphType::Price, GraphType::Arrival];
const PRICE_ONLY: &[GraphType] = &[GraphType::Price];

pub static WHEAT: CommoditySchema = CommoditySchema {
    key: "wheat",
    name: "Wheat",
    sheet: "wheat",
    dimension: Some(DimensionKind::Variety),
    has_state: true,
    supports_arrivals: true,
    // Literal run label, not the latest model run; interactive_defaults() warns when they diverge.
    interactive: DefaultSelections {
        graph_types: PRICE_AND_ARRIVAL,
        financial_years: FY_SHORT,
        model: ModelDefault::Fixed("Predicted Mid July"),
        dimensions: Some(&["Raj"]),
        states: Some(MADHYA_PRADESH),
    },
    export: DefaultSelections {
        graph_types: PRICE_AND_ARRIVAL,
        financial_years: FY_SHORT,
        model: ModelDefault::LatestRun,
        dimensions: Some(&["Raj"]),
        states: Some(MADHYA_PRADESH),
    },
};

pub static CHANA: CommoditySchema = CommoditySchema {
    key: "chana",
    name: "Chana",
    sheet: "chana",
    dimension: None,
    has_state: true,
    supports_arrivals: true,
    interactive: DefaultSelections {
        graph_types: PRICE_AND_ARRIVAL,
        financial_years: &["2025-2026", "2024-2025"],
        model: ModelDefault::LatestRun,
        dimensions: None,
        states: Some(MADHYA_PRADESH),
    },
    export: DefaultSelections {
        graph_types: PRICE_AND_ARRIVAL,
        financial_years: &["2025-2026", "2024-2025"],
        model: ModelDefault::LatestRun,
        dimensions: None,
        states: Some(MADHYA_PRADESH),
    },
};

pub static SHRIMP: CommoditySchema = CommoditySchema {
    key: "shrimp",
    name: "Shrimp",
    sheet: "shrimp",
    dimension: Some(DimensionKind::Count),
    has_state: false,
    supports_arrivals: false,
    interactive: DefaultSelections {
        graph_types: PRICE_ONLY,
        financial_years: FY_SHORT,
        model: ModelDefault::LatestRun,
        dimensions: Some(&["60C"]),
        states: None,
    },
    export: DefaultSelections {
        graph_types: PRICE_ONLY,
        financial_years: FY_SHORT,
        model: ModelDefault::LatestRun,
        dimensions: Some(&["60C"]),
        states: None,
    },
};

static REGISTRY: [&CommoditySchema; 3] = [&WHEAT, &CHANA, &SHRIMP];

/// Crops on the summary grid, row by row.
pub const SUMMARY_LAYOUT: [&str; 9] = [
    "wheat",
    "finepaddy",
    "shrimp",
    "soya",
    "basmati",
    "chana",
    "coffee",
    "maize",
    "chili",
];

/// All registered commodities.
pub fn registry() -> &'static [&'static CommoditySchema] {
    &REGISTRY
}

/// Case-insensitive lookup by key.
pub fn lookup(key: &str) -> Option<&'static CommoditySchema> {
    let key = key.trim();
    REGISTRY
        .iter()
        .copied()
        .find(|c| c.key.eq_ignore_ascii_case(key))
}

/// Registered commodities in summary-grid order; unregistered crops are skipped.
pub fn summary_commodities() -> Vec<&'static CommoditySchema> {
    SUMMARY_LAYOUT.iter().filter_map(|k| lookup(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("Wheat").map(|c| c.sheet), Some("wheat"));
        assert_eq!(lookup(" SHRIMP ").map(|c| c.key), Some("shrimp"));
        assert!(lookup("soya").is_none());
    }

    #[test]
    fn summary_keeps_layout_order() {
        let keys: Vec<&str> = summary_commodities().iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["wheat", "shrimp", "chana"]);
    }

    #[test]
    fn titles_follow_arrival_support() {
        assert_eq!(WHEAT.chart_title(), "Monthly Wheat Price and Arrival Trend");
        assert_eq!(SHRIMP.chart_title(), "Monthly Shrimp Price Trend");
        assert_eq!(CHANA.page_title(), "Chana Price and Arrival Trend");
        assert!(!SHRIMP.chartable(GraphType::Arrival));
        assert!(SHRIMP.chartable(GraphType::Price));
    }

    #[test]
    fn wheat_interactive_model_is_fixed_literal() {
        let sel = WHEAT.interactive_defaults();
        assert!(sel.models.contains("Actual"));
        assert!(sel.models.contains("Predicted Mid July"));
        assert_eq!(sel.dimensions.as_ref().map(|d| d.len()), Some(1));
        assert!(sel.states.as_ref().unwrap().contains("Madhya Pradesh"));
    }

    #[test]
    fn shrimp_defaults_have_no_state() {
        let sel = SHRIMP.export_defaults();
        assert!(sel.states.is_none());
        assert!(sel.dimensions.unwrap().contains("60C"));
        assert_eq!(sel.graph_types.len(), 1);
    }
}
