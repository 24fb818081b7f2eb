//! Workbook loading.
//!
//! A workbook is either a spreadsheet file read with `calamine`
//! (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) or a directory in which sheet
//! `wheat` is stored as `wheat.csv`. Each sheet has identifying columns plus
//! twelve month columns (`Apr` … `Mar`); loading melts it into one
//! [`Observation`] per month and caches the result by sheet name.
//!
//! ```no_run
//! # use astra_prognosis::Loader;
//! let loader = Loader::open("price_data.xlsx");
//! let wheat = loader.load("wheat")?;
//! let again = loader.load("wheat")?; // served from the cache
//! assert!(std::sync::Arc::ptr_eq(&wheat, &again));
//! # Ok::<(), astra_prognosis::LoadError>(())
//! ```

use crate::models::{Cell, DimensionKind, GraphType, Month, Observation, ParseLabelError, Table};
use ahash::AHashMap;
use calamine::{Data, Reader};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub const COL_GRAPH_TYPE: &str = "Graph Type";
pub const COL_FINANCIAL_YEAR: &str = "Financial Year";
pub const COL_MODEL: &str = "Model";
pub const COL_STATE: &str = "State";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read sheet {sheet:?} from {path}: {source}")]
    Sheet {
        sheet: String,
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read CSV sheet {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("sheet {sheet:?} not found in {path}")]
    MissingSheet { sheet: String, path: PathBuf },
    #[error("sheet {sheet:?} has no header row")]
    EmptySheet { sheet: String },
    #[error("sheet {sheet:?} is missing required column {column:?}")]
    MissingColumn { sheet: String, column: String },
    #[error("sheet {sheet:?} has both \"Variety\" and \"Count\" columns")]
    AmbiguousDimension { sheet: String },
    #[error("sheet {sheet:?}, row {row}: {source}")]
    BadLabel {
        sheet: String,
        row: usize,
        #[source]
        source: ParseLabelError,
    },
}

#[derive(Debug, Clone)]
enum Source {
    Spreadsheet(PathBuf),
    CsvDir(PathBuf),
}

/// Reads sheets from one workbook and caches the melted tables.
#[derive(Debug)]
pub struct Loader {
    source: Source,
    cache: Mutex<AHashMap<String, Arc<Table>>>,
}

impl Loader {
    /// Only inspects whether `path` is a directory; sheets are read on first [`Loader::load`].
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let source = if path.is_dir() {
            Source::CsvDir(path)
        } else {
            Source::Spreadsheet(path)
        };
        Self {
            source,
            cache: Mutex::new(AHashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        match &self.source {
            Source::Spreadsheet(p) | Source::CsvDir(p) => p,
        }
    }

    /// Long-form table for `sheet`, read once and then served from the cache.
    pub fn load(&self, sheet: &str) -> Result<Arc<Table>, LoadError> {
        if let Some(table) = self.lock().get(sheet) {
            debug!("cache hit for sheet {sheet:?}");
            return Ok(Arc::clone(table));
        }

        let grid = match &self.source {
            Source::Spreadsheet(path) => read_spreadsheet(path, sheet)?,
            Source::CsvDir(dir) => read_csv_sheet(dir, sheet)?,
        };
        let table = Arc::new(melt(sheet, grid)?);
        info!(
            "loaded sheet {sheet:?} from {}: {} observations",
            self.path().display(),
            table.len()
        );

        // Another caller may have raced us; keep whichever landed first.
        let mut cache = self.lock();
        let entry = cache
            .entry(sheet.to_string())
            .or_insert_with(|| Arc::clone(&table));
        Ok(Arc::clone(entry))
    }

    pub fn is_cached(&self, sheet: &str) -> bool {
        self.lock().contains_key(sheet)
    }

    /// Forget every cached sheet; the next load re-reads the source.
    pub fn clear_cache(&self) {
        let mut cache = self.lock();
        debug!("clearing {} cached sheet(s)", cache.len());
        cache.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AHashMap<String, Arc<Table>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_spreadsheet(path: &Path, sheet: &str) -> Result<Vec<Vec<Cell>>, LoadError> {
    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(LoadError::MissingSheet {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| LoadError::Sheet {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

fn read_csv_sheet(dir: &Path, sheet: &str) -> Result<Vec<Vec<Cell>>, LoadError> {
    let path = dir.join(format!("{sheet}.csv"));
    if !path.is_file() {
        return Err(LoadError::MissingSheet {
            sheet: sheet.to_string(),
            path: dir.to_path_buf(),
        });
    }
    let csv_err = |source| LoadError::Csv {
        path: path.clone(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&path)
        .map_err(csv_err)?;
    let mut grid = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

/// Column positions of one sheet.
#[derive(Debug)]
struct ColumnLayout {
    graph_type: usize,
    financial_year: usize,
    model: usize,
    dimension: Option<(DimensionKind, usize)>,
    state: Option<usize>,
    months: [(Month, usize); 12],
}

impl ColumnLayout {
    fn from_header(sheet: &str, header: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                sheet: sheet.to_string(),
                column: name.to_string(),
            })
        };

        let variety = find(DimensionKind::Variety.header());
        let count = find(DimensionKind::Count.header());
        let dimension = match (variety, count) {
            (Some(_), Some(_)) => {
                return Err(LoadError::AmbiguousDimension {
                    sheet: sheet.to_string(),
                });
            }
            (Some(i), None) => Some((DimensionKind::Variety, i)),
            (None, Some(i)) => Some((DimensionKind::Count, i)),
            (None, None) => None,
        };

        let mut months = [(Month::Apr, 0usize); 12];
        for (slot, month) in months.iter_mut().zip(Month::ALL) {
            *slot = (month, require(month.as_str())?);
        }

        let layout = Self {
            graph_type: require(COL_GRAPH_TYPE)?,
            financial_year: require(COL_FINANCIAL_YEAR)?,
            model: require(COL_MODEL)?,
            dimension,
            state: find(COL_STATE),
            months,
        };

        for (idx, name) in header.iter().enumerate() {
            if !layout.uses(idx) && !name.is_empty() {
                debug!("sheet {sheet:?}: ignoring column {name:?}");
            }
        }
        Ok(layout)
    }

    fn uses(&self, idx: usize) -> bool {
        idx == self.graph_type
            || idx == self.financial_year
            || idx == self.model
            || self.dimension.is_some_and(|(_, i)| i == idx)
            || self.state == Some(idx)
            || self.months.iter().any(|(_, i)| *i == idx)
    }
}

/// Wide → long: one observation per (data row, month), months in fiscal order.
fn melt(sheet: &str, grid: Vec<Vec<Cell>>) -> Result<Table, LoadError> {
    let mut rows = grid.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| LoadError::EmptySheet {
            sheet: sheet.to_string(),
        })?
        .iter()
        .map(Cell::to_label)
        .collect();
    let layout = ColumnLayout::from_header(sheet, &header)?;

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);
        let label = |idx: usize| cell(idx).to_label();

        let graph_type =
            label(layout.graph_type)
                .parse::<GraphType>()
                .map_err(|source| LoadError::BadLabel {
                    sheet: sheet.to_string(),
                    // 1-based, counting the header
                    row: i + 2,
                    source,
                })?;
        let financial_year = label(layout.financial_year);
        let model = label(layout.model);
        let dimension = layout.dimension.map(|(_, idx)| label(idx));
        let state = layout.state.map(label);

        for (month, idx) in layout.months {
            out.push(Observation {
                graph_type,
                financial_year: financial_year.clone(),
                model: model.clone(),
                dimension: dimension.clone(),
                state: state.clone(),
                month,
                value: cell(idx),
            });
        }
    }

    Ok(Table {
        dimension: layout.dimension.map(|(kind, _)| kind),
        has_state: layout.state.is_some(),
        rows: out,
    })
}
