use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Model label that marks observed (non-forecast) rows.
pub const ACTUAL_MODEL: &str = "Actual";

/// Error returned when a categorical label does not name a known value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} {label:?}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub label: String,
}

/// Month of a financial year that starts in April.
///
/// Declaration order is the fiscal order, so the derived `Ord` sorts
/// `Apr < May < … < Mar` rather than alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
    Jan,
    Feb,
    Mar,
}

impl Month {
    /// Canonical fiscal ordering used for every axis and sort.
    pub const ALL: [Month; 12] = [
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
        Month::Jan,
        Month::Feb,
        Month::Mar,
    ];

    /// Position in the fiscal year (`Apr` = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Month> {
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLabelError {
                kind: "month",
                label: s.to_string(),
            })
    }
}

/// Whether a row is a price observation or an arrival-volume observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GraphType {
    Price,
    Arrival,
}

impl GraphType {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::Price => "Price",
            GraphType::Arrival => "Arrival",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(GraphType::Price),
            "arrival" => Ok(GraphType::Arrival),
            _ => Err(ParseLabelError {
                kind: "graph type",
                label: s.trim().to_string(),
            }),
        }
    }
}

/// Commodity-specific extra categorical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Wheat varieties (e.g. "Raj").
    Variety,
    /// Shrimp count/size grade (e.g. "60C").
    Count,
}

impl DimensionKind {
    /// Sheet header for this dimension.
    pub fn header(self) -> &'static str {
        match self {
            DimensionKind::Variety => "Variety",
            DimensionKind::Count => "Count",
        }
    }
}

/// One spreadsheet cell.
///
/// Raw sheet cells keep whatever the workbook held; filtered tables only ever
/// contain `Number` or `Empty` (missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Numeric reading of the cell. Never fails: anything that is not a finite
    /// number is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Numeric coercion; failures become `Empty`.
    pub fn coerce(&self) -> Cell {
        match self.as_number() {
            Some(v) => Cell::Number(v),
            None => Cell::Empty,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.as_number().is_none()
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Categorical reading of the cell. Whole numbers print without a
    /// fractional part so a numeric "2024" header or label stays "2024".
    pub fn to_label(&self) -> String {
        match self {
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// Tidy structure used by this crate (one row = one month observation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub graph_type: GraphType,
    pub financial_year: String,
    pub model: String,
    /// Variety or Count, when the commodity has one.
    pub dimension: Option<String>,
    pub state: Option<String>,
    pub month: Month,
    pub value: Cell,
}

impl Observation {
    /// Every categorical field except graph type and month.
    pub fn series_key(&self) -> SeriesKey {
        SeriesKey {
            financial_year: self.financial_year.clone(),
            model: self.model.clone(),
            dimension: self.dimension.clone(),
            state: self.state.clone(),
        }
    }
}

/// Grouping key used when building chart series.
///
/// Field order is the grouping order; the derived `Ord` is the order in
/// which groups are enumerated and colored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub financial_year: String,
    pub model: String,
    pub dimension: Option<String>,
    pub state: Option<String>,
}

impl SeriesKey {
    pub fn is_actual(&self) -> bool {
        self.model == ACTUAL_MODEL
    }

    /// `"{GraphType} - {FinancialYear} - {Model} - [{Dimension} - ]{State}"`,
    /// absent fields omitted.
    pub fn label(&self, graph_type: GraphType) -> String {
        let mut parts = vec![
            graph_type.as_str(),
            self.financial_year.as_str(),
            self.model.as_str(),
        ];
        if let Some(d) = self.dimension.as_deref() {
            parts.push(d);
        }
        if let Some(s) = self.state.as_deref() {
            parts.push(s);
        }
        parts.join(" - ")
    }
}

/// Categorical columns a table can be sliced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    GraphType,
    FinancialYear,
    Model,
    Dimension,
    State,
}

/// Long-form table for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Which dimension column the sheet carried, if any.
    pub dimension: Option<DimensionKind>,
    /// Whether the sheet carried a "State" column.
    pub has_state: bool,
    pub rows: Vec<Observation>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same columns, different rows.
    pub fn with_rows(&self, rows: Vec<Observation>) -> Table {
        Table {
            dimension: self.dimension,
            has_state: self.has_state,
            rows,
        }
    }

    /// Distinct values of `field` in order of first appearance.
    pub fn unique_values(&self, field: Field) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let value = match field {
                Field::GraphType => Some(row.graph_type.as_str()),
                Field::FinancialYear => Some(row.financial_year.as_str()),
                Field::Model => Some(row.model.as_str()),
                Field::Dimension => row.dimension.as_deref(),
                Field::State => row.state.as_deref(),
            };
            if let Some(v) = value
                && seen.insert(v)
            {
                out.push(v.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_sort_in_fiscal_order() {
        let mut months = vec![Month::Jan, Month::Apr, Month::Mar, Month::Dec, Month::May];
        months.sort();
        assert_eq!(
            months,
            vec![Month::Apr, Month::May, Month::Dec, Month::Jan, Month::Mar]
        );
        assert_eq!(Month::Mar.index(), 11);
        assert_eq!(Month::from_index(9), Some(Month::Jan));
        assert_eq!(Month::from_index(12), None);
    }

    #[test]
    fn month_and_graph_type_parse() {
        assert_eq!(" oct ".parse::<Month>().unwrap(), Month::Oct);
        assert!("October".parse::<Month>().is_err());
        assert_eq!("Arrival".parse::<GraphType>().unwrap(), GraphType::Arrival);
        let err = "Volume".parse::<GraphType>().unwrap_err();
        assert_eq!(err.label, "Volume");
    }

    #[test]
    fn coercion_is_total() {
        assert_eq!(Cell::Text(" 2100 ".into()).coerce(), Cell::Number(2100.0));
        assert_eq!(Cell::Text("NA".into()).coerce(), Cell::Empty);
        assert_eq!(Cell::Text("NaN".into()).coerce(), Cell::Empty);
        assert_eq!(Cell::Number(f64::INFINITY).coerce(), Cell::Empty);
        assert_eq!(Cell::Empty.coerce(), Cell::Empty);
        assert!(Cell::Text("--".into()).is_missing());
    }

    #[test]
    fn labels_of_numeric_cells() {
        assert_eq!(Cell::Number(2024.0).to_label(), "2024");
        assert_eq!(Cell::Number(1.5).to_label(), "1.5");
        assert_eq!(Cell::Text("  Raj ".into()).to_label(), "Raj");
    }

    #[test]
    fn series_label_skips_absent_fields() {
        let key = SeriesKey {
            financial_year: "2024-25".into(),
            model: "Actual".into(),
            dimension: Some("60C".into()),
            state: None,
        };
        assert_eq!(key.label(GraphType::Price), "Price - 2024-25 - Actual - 60C");
        assert!(key.is_actual());
    }
}
