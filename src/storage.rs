use crate::chart::ChartSpec;
use crate::loader::{COL_FINANCIAL_YEAR, COL_GRAPH_TYPE, COL_MODEL, COL_STATE};
use crate::models::Table;
use anyhow::Result;
use csv::WriterBuilder;
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save a table as long-form CSV with header. Dimension and state columns
/// appear only when the sheet has them; missing values are empty cells.
pub fn save_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_path(path)?;

    let mut header = vec![COL_GRAPH_TYPE, COL_FINANCIAL_YEAR, COL_MODEL];
    if let Some(dim) = table.dimension {
        header.push(dim.header());
    }
    if table.has_state {
        header.push(COL_STATE);
    }
    header.extend(["Month", "Value"]);
    wtr.write_record(&header)?;

    for obs in &table.rows {
        let mut record = vec![
            obs.graph_type.as_str().to_string(),
            obs.financial_year.clone(),
            obs.model.clone(),
        ];
        if table.dimension.is_some() {
            record.push(obs.dimension.clone().unwrap_or_default());
        }
        if table.has_state {
            record.push(obs.state.clone().unwrap_or_default());
        }
        record.push(obs.month.as_str().to_string());
        record.push(obs.value.as_number().map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Save the chart as a pretty Plotly `{data, layout}` document.
pub fn save_json<P: AsRef<Path>>(spec: &ChartSpec, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&spec.to_plotly_json())?;
    f.write_all(s.as_bytes())?;
    info!("wrote chart document to {}", path.display());
    Ok(())
}
