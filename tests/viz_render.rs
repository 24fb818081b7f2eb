use astra_prognosis::chart::{LineDash, build_chart};
use astra_prognosis::commodity::{CHANA, WHEAT};
use astra_prognosis::models::{Cell, DimensionKind, GraphType, Month, Observation, Table};
use astra_prognosis::viz::{self, Tile};
use astra_prognosis::ChartSpec;
use std::fs;
use std::path::PathBuf;

fn sample_table() -> Table {
    let mut rows = Vec::new();
    for (model, base) in [("Actual", 2100.0), ("Predicted Mid July", 2120.0)] {
        for (i, month) in Month::ALL.into_iter().enumerate() {
            // Leave a gap in the forecast line.
            let value = if model != "Actual" && month == Month::Sep {
                Cell::Empty
            } else {
                Cell::Number(base + 25.0 * i as f64)
            };
            rows.push(Observation {
                graph_type: GraphType::Price,
                financial_year: "2024-25".into(),
                model: model.into(),
                dimension: Some("Raj".into()),
                state: Some("Madhya Pradesh".into()),
                month,
                value,
            });
        }
    }
    for (i, month) in Month::ALL.into_iter().enumerate() {
        rows.push(Observation {
            graph_type: GraphType::Arrival,
            financial_year: "2024-25".into(),
            model: "Actual".into(),
            dimension: Some("Raj".into()),
            state: Some("Madhya Pradesh".into()),
            month,
            value: Cell::Number(600.0 - 40.0 * i as f64),
        });
    }
    Table {
        dimension: Some(DimensionKind::Variety),
        has_state: true,
        rows,
    }
}

fn sample_spec(show_legend: bool) -> ChartSpec {
    build_chart(
        &WHEAT,
        &[GraphType::Price, GraphType::Arrival],
        &sample_table(),
        show_legend,
    )
}

fn write_and_check<F: Fn(&PathBuf)>(maker: F, name: &str) -> Vec<u8> {
    let tmp = std::env::temp_dir();
    let path: PathBuf = tmp.join(format!("astra_viz_{}_{}", std::process::id(), name));
    maker(&path);
    let bytes = fs::read(&path).expect("file created");
    assert!(!bytes.is_empty(), "{name} has content");
    fs::remove_file(&path).ok();
    bytes
}

#[test]
fn renders_svg_and_png() {
    let spec = sample_spec(true);
    let svg = write_and_check(
        |p| viz::render_to_file(&spec, p, 1000, 600).unwrap(),
        "chart.svg",
    );
    let svg = String::from_utf8(svg).unwrap();
    assert!(svg.starts_with("<svg") || svg.contains("<svg"));

    let png = write_and_check(
        |p| viz::render_to_file(&spec, p, 1000, 600).unwrap(),
        "chart.png",
    );
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn svg_string_carries_title_and_labels() {
    let svg = viz::render_svg_string(&sample_spec(true), 1000, 600).unwrap();
    assert!(svg.contains("Monthly Wheat Price and Arrival Trend"));
    assert!(svg.contains("2100"));
    assert!(svg.contains("Arrival"));
}

#[test]
fn chart_without_legend_renders() {
    let bytes = viz::export_image(&sample_spec(false), 480, 320).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn exported_png_decodes_at_requested_size() {
    let bytes = viz::export_image(&sample_spec(true), 480, 320).unwrap();
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap();
    assert_eq!((img.width(), img.height()), (480, 320));
}

#[test]
fn line_series_without_values_keeps_its_legend_entry() {
    let mut spec = sample_spec(true);
    let mut blank = spec
        .series
        .iter()
        .find(|s| s.dash() == Some(LineDash::Dash))
        .cloned()
        .unwrap();
    blank.name = "Unreleased Run".into();
    for p in &mut blank.points {
        p.value = None;
    }
    spec.series.push(blank);

    let svg = viz::render_svg_string(&spec, 1000, 600).unwrap();
    assert!(svg.contains("Unreleased Run"));
}

#[test]
fn price_only_chart_renders_without_secondary_axis() {
    let table = sample_table();
    let spec = build_chart(&CHANA, &[GraphType::Price], &table, true);
    assert!(spec.y2_axis.is_none());
    let svg = viz::render_svg_string(&spec, 800, 500).unwrap();
    assert!(!svg.is_empty());
}

#[test]
fn empty_spec_is_rejected() {
    let spec = build_chart(&WHEAT, &[GraphType::Price], &Table::default(), true);
    assert!(spec.is_empty());
    let path = std::env::temp_dir().join(format!("astra_viz_{}_empty.svg", std::process::id()));
    assert!(viz::render_to_file(&spec, &path, 400, 300).is_err());
    assert!(viz::export_image(&spec, 400, 300).is_err());
}

#[test]
fn summary_grid_mixes_charts_and_placeholders() {
    let tiles = vec![
        Tile::new("WHEAT", Some(sample_spec(false))),
        Tile::new("SHRIMP", None),
        Tile::new("CHANA", Some(sample_spec(false))),
        Tile::new("SOYA", None),
    ];
    let png = write_and_check(
        |p| viz::render_summary(&tiles, p, 320, 240).unwrap(),
        "summary.png",
    );
    assert_eq!(&png[1..4], b"PNG");

    let svg = write_and_check(
        |p| viz::render_summary(&tiles, p, 320, 240).unwrap(),
        "summary.svg",
    );
    let svg = String::from_utf8(svg).unwrap();
    assert!(svg.contains("SHRIMP"));
    assert!(svg.contains(viz::summary::NO_DATA_TEXT));
}
