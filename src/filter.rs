use crate::models::{GraphType, Observation, Table};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Accepted values per categorical field.
///
/// `None` for `dimensions`/`states` means the field does not exist for the
/// commodity. A supplied set always constrains: rows lacking that field
/// never match it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    pub graph_types: BTreeSet<GraphType>,
    pub financial_years: BTreeSet<String>,
    pub models: BTreeSet<String>,
    pub dimensions: Option<BTreeSet<String>>,
    pub states: Option<BTreeSet<String>>,
}

fn to_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

impl Selections {
    pub fn new<G, F, M>(graph_types: G, financial_years: F, models: M) -> Self
    where
        G: IntoIterator<Item = GraphType>,
        F: IntoIterator,
        F::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            graph_types: graph_types.into_iter().collect(),
            financial_years: to_set(financial_years),
            models: to_set(models),
            dimensions: None,
            states: None,
        }
    }

    pub fn with_dimensions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = Some(to_set(values));
        self
    }

    pub fn with_states<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(to_set(values));
        self
    }

    /// True when every constrained field of `obs` is in its accepted set.
    pub fn accepts(&self, obs: &Observation) -> bool {
        self.graph_types.contains(&obs.graph_type)
            && self.financial_years.contains(&obs.financial_year)
            && self.models.contains(&obs.model)
            && accepts_optional(self.dimensions.as_ref(), obs.dimension.as_deref())
            && accepts_optional(self.states.as_ref(), obs.state.as_deref())
    }
}

fn accepts_optional(set: Option<&BTreeSet<String>>, value: Option<&str>) -> bool {
    match (set, value) {
        (None, _) => true,
        (Some(set), Some(v)) => set.contains(v),
        (Some(_), None) => false,
    }
}

/// Result of [`filter`]: matching rows with numeric values, plus the
/// coercion warning flag.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub table: Table,
    /// Some kept row has a missing value (blank or not a number).
    pub coercion_failed: bool,
}

impl FilteredView {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Keep rows accepted by `selections`, then coerce every kept value to a
/// number (failures become missing). Never errors; an empty view is valid.
pub fn filter(table: &Table, selections: &Selections) -> FilteredView {
    let rows: Vec<Observation> = table
        .rows
        .iter()
        .filter(|obs| selections.accepts(obs))
        .map(|obs| Observation {
            value: obs.value.coerce(),
            ..obs.clone()
        })
        .collect();

    let missing = rows.iter().filter(|o| o.value.is_missing()).count();
    let coercion_failed = missing > 0;
    if coercion_failed {
        warn!("{missing} value(s) could not be converted to numbers and are treated as missing");
    }
    debug!("filter kept {} of {} rows", rows.len(), table.len());

    FilteredView {
        table: table.with_rows(rows),
        coercion_failed,
    }
}
