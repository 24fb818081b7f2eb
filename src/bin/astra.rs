use anyhow::{Context, Result, anyhow, bail};
use astra_prognosis::chart::{LineDash, SeriesKind};
use astra_prognosis::commodity::{self, CommoditySchema};
use astra_prognosis::config::Settings;
use astra_prognosis::models::{Field, GraphType};
use astra_prognosis::page::{self, ChartView};
use astra_prognosis::{Loader, storage, viz};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "astra",
    version,
    about = "Load, filter & chart commodity price and arrival forecasts"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Workbook file (.xlsx, .xls, .ods) or a directory of <sheet>.csv files.
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,
    /// JSON settings file (default: <config dir>/astra/config.json when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Label of the current forecast run (e.g. "Predicted Mid July").
    #[arg(long, global = true)]
    latest_model_run: Option<String>,
    /// Image width in pixels (per tile for `summary`).
    #[arg(long, global = true)]
    width: Option<u32>,
    /// Image height in pixels (per tile for `summary`).
    #[arg(long, global = true)]
    height: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the values each filter can take for a commodity.
    Options(OptionsArgs),
    /// Run a commodity page: filter, print notices and metrics, write the chart.
    Page(PageArgs),
    /// Render the default-selection thumbnail (PNG) of a commodity.
    Export(ExportArgs),
    /// Render the summary grid of all registered commodities.
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct OptionsArgs {
    /// Commodity key (e.g. wheat, chana, shrimp).
    commodity: String,
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Commodity key (e.g. wheat, chana, shrimp).
    commodity: String,
    /// Graph types separated by comma or semicolon (Price, Arrival).
    #[arg(long)]
    graph_type: Option<String>,
    /// Financial years separated by comma or semicolon (e.g. 2025-26,2024-25).
    #[arg(long)]
    fy: Option<String>,
    /// Models separated by comma or semicolon (e.g. "Actual,Predicted Mid July").
    #[arg(long)]
    model: Option<String>,
    /// Variety or count values separated by comma or semicolon.
    #[arg(long)]
    dimension: Option<String>,
    /// States separated by comma or semicolon.
    #[arg(long)]
    state: Option<String>,
    /// Write the chart to this path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Write the Plotly chart document to this path.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write the filtered rows to this path.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Hide the chart legend.
    #[arg(long, default_value_t = false)]
    no_legend: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Commodity key (e.g. wheat, chana, shrimp).
    commodity: String,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Output path (.svg or .png).
    #[arg(long)]
    out: PathBuf,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn resolve_commodity(key: &str) -> Result<&'static CommoditySchema> {
    commodity::lookup(key).ok_or_else(|| {
        let known: Vec<&str> = commodity::registry().iter().map(|c| c.key).collect();
        anyhow!(
            "unknown commodity {key:?}; expected one of: {}",
            known.join(", ")
        )
    })
}

fn resolve_settings(global: &GlobalArgs) -> Result<Settings> {
    let mut settings = Settings::discover(global.config.as_deref())?;
    if let Some(workbook) = &global.workbook {
        settings.workbook = workbook.clone();
    }
    if let Some(label) = &global.latest_model_run {
        settings.latest_model_run = label.clone();
    }
    if let Some(width) = global.width {
        settings.width = width;
        settings.thumbnail_width = width;
    }
    if let Some(height) = global.height {
        settings.height = height;
        settings.thumbnail_height = height;
    }
    settings.apply()?;
    Ok(settings)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli.global)?;
    let loader = Loader::open(&settings.workbook);
    match cli.cmd {
        Command::Options(args) => cmd_options(&loader, args),
        Command::Page(args) => cmd_page(&loader, &settings, args),
        Command::Export(args) => cmd_export(&loader, &settings, args),
        Command::Summary(args) => cmd_summary(&loader, &settings, args),
    }
}

fn cmd_options(loader: &Loader, args: OptionsArgs) -> Result<()> {
    let schema = resolve_commodity(&args.commodity)?;
    let table = loader.load(schema.sheet)?;

    let mut fields = vec![
        ("Graph Type", Field::GraphType),
        ("Financial Year", Field::FinancialYear),
        ("Model", Field::Model),
    ];
    if let Some(dim) = table.dimension {
        fields.push((dim.header(), Field::Dimension));
    }
    if table.has_state {
        fields.push(("State", Field::State));
    }
    for (name, field) in fields {
        println!("{name}: {}", table.unique_values(field).join(", "));
    }
    Ok(())
}

fn cmd_page(loader: &Loader, settings: &Settings, args: PageArgs) -> Result<()> {
    let schema = resolve_commodity(&args.commodity)?;
    let mut selections = schema.interactive_defaults();

    if let Some(s) = &args.graph_type {
        selections.graph_types = parse_list(s)
            .iter()
            .map(|g| g.parse::<GraphType>())
            .collect::<Result<_, _>>()?;
    }
    if let Some(s) = &args.fy {
        selections.financial_years = parse_list(s).into_iter().collect();
    }
    if let Some(s) = &args.model {
        selections.models = parse_list(s).into_iter().collect();
    }
    if let Some(s) = &args.dimension {
        if schema.dimension.is_none() {
            bail!("{} has no variety or count column", schema.key);
        }
        selections.dimensions = Some(parse_list(s).into_iter().collect());
    }
    if let Some(s) = &args.state {
        if !schema.has_state {
            bail!("{} has no state column", schema.key);
        }
        selections.states = Some(parse_list(s).into_iter().collect());
    }

    let outcome = page::run_page(loader, schema, &selections, !args.no_legend)?;

    println!("{}", outcome.title);
    for warning in &outcome.warnings {
        println!("Warning: {warning}");
    }
    if let ChartView::Chart(spec) = &outcome.view {
        for s in &spec.series {
            let kind = match s.kind {
                SeriesKind::Bar { .. } => "bar",
                SeriesKind::Line { dash: LineDash::Solid } => "solid line",
                SeriesKind::Line { dash: LineDash::Dash } => "dashed line",
            };
            println!("  {} ({kind})", s.name);
        }
    }
    println!();
    print!("{}", page::metrics_markdown(&outcome.metrics));

    if let Some(path) = args.csv.as_ref() {
        storage::save_csv(&outcome.filtered.table, path)?;
        eprintln!(
            "Saved {} rows to {}",
            outcome.filtered.table.len(),
            path.display()
        );
    }

    match outcome.view.chart() {
        Some(spec) => {
            if let Some(path) = args.plot.as_ref() {
                viz::render_to_file(spec, path, settings.width, settings.height)?;
                eprintln!("Wrote plot to {}", path.display());
            }
            if let Some(path) = args.json.as_ref() {
                storage::save_json(spec, path)?;
                eprintln!("Wrote chart document to {}", path.display());
            }
        }
        None if args.plot.is_some() || args.json.is_some() => {
            eprintln!("Nothing to chart; no plot written");
        }
        None => {}
    }
    Ok(())
}

fn cmd_export(loader: &Loader, settings: &Settings, args: ExportArgs) -> Result<()> {
    let schema = resolve_commodity(&args.commodity)?;
    let bytes = page::export_thumbnail(
        loader,
        schema,
        settings.thumbnail_width,
        settings.thumbnail_height,
    )?
    .ok_or_else(|| anyhow!("{}: {}", schema.key, page::EMPTY_WARNING))?;
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("writing {}", args.out.display()))?;
    eprintln!("Wrote {} bytes to {}", bytes.len(), args.out.display());
    Ok(())
}

fn cmd_summary(loader: &Loader, settings: &Settings, args: SummaryArgs) -> Result<()> {
    let tiles = page::summary_tiles(loader)?;
    viz::render_summary(
        &tiles,
        &args.out,
        settings.thumbnail_width,
        settings.thumbnail_height,
    )?;
    eprintln!("Wrote summary of {} tiles to {}", tiles.len(), args.out.display());
    Ok(())
}
