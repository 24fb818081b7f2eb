//! astra_prognosis
//!
//! A lightweight Rust library for loading, filtering, and charting commodity
//! price and arrival forecasts kept in a workbook (one sheet per commodity).
//! Pairs with the `astra` CLI.
//!
//! ### Features
//! - Read `.xlsx`/`.xls`/`.ods` workbooks, or a directory of per-sheet CSV files
//! - Reshape wide month columns into a tidy long-form table, cached per sheet
//! - Filter by graph type, financial year, model, variety/count, and state
//! - Dual-axis charts: arrival bars behind, forecast lines dashed, actual lines solid
//! - Render SVG/PNG files, headless PNG thumbnails, and a tiled summary view
//!
//! ### Example
//! ```no_run
//! use astra_prognosis::{commodity, page, viz, Loader};
//!
//! let loader = Loader::open("price_data.xlsx");
//! let wheat = commodity::lookup("wheat").expect("registered");
//! let outcome = page::run_page(&loader, wheat, &wheat.interactive_defaults(), true)?;
//! for warning in &outcome.warnings {
//!     eprintln!("{warning}");
//! }
//! if let page::ChartView::Chart(spec) = &outcome.view {
//!     viz::render_to_file(spec, "wheat.svg", 1000, 600)?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod chart;
pub mod commodity;
pub mod config;
pub mod filter;
pub mod loader;
pub mod models;
pub mod page;
pub mod storage;
pub mod viz;

pub use chart::{ChartSpec, build_chart};
pub use commodity::CommoditySchema;
pub use filter::{FilteredView, Selections, filter};
pub use loader::{LoadError, Loader};
pub use models::{Cell, GraphType, Month, Observation, SeriesKey, Table};
