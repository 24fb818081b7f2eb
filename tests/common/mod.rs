#![allow(dead_code)]

use std::path::Path;
use tempfile::TempDir;

pub const MONTHS: [&str; 12] = [
    "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan", "Feb", "Mar",
];

pub const WHEAT_IDS: [&str; 5] = ["Graph Type", "Financial Year", "Model", "Variety", "State"];
pub const CHANA_IDS: [&str; 4] = ["Graph Type", "Financial Year", "Model", "State"];
pub const SHRIMP_IDS: [&str; 4] = ["Graph Type", "Financial Year", "Model", "Count"];

/// Write `<dir>/<sheet>.csv`: the id columns, then the twelve months.
/// Each row lists id values followed by month values; short rows are padded
/// with blanks.
pub fn write_sheet(dir: &Path, sheet: &str, ids: &[&str], rows: &[&[&str]]) {
    let mut wtr = csv::Writer::from_path(dir.join(format!("{sheet}.csv"))).unwrap();
    let header: Vec<&str> = ids.iter().copied().chain(MONTHS).collect();
    wtr.write_record(&header).unwrap();
    for row in rows {
        let mut rec: Vec<&str> = row.to_vec();
        rec.resize(header.len(), "");
        wtr.write_record(&rec).unwrap();
    }
    wtr.flush().unwrap();
}

/// A CSV workbook with wheat, chana and shrimp sheets.
pub fn workbook() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(
        dir.path(),
        "wheat",
        &WHEAT_IDS,
        &[
            &[
                "Price", "2024-25", "Actual", "Raj", "Madhya Pradesh", "2100", "2150", "2200",
                "2250", "2300", "2350", "2400", "2450", "2500", "2550", "2600", "2650",
            ],
            &[
                "Price", "2024-25", "Predicted Mid July", "Raj", "Madhya Pradesh", "2120", "2160",
                "2190", "2260", "2310", "2340", "2410", "2460", "2490", "2560", "2610", "2640",
            ],
            &[
                "Arrival", "2024-25", "Actual", "Raj", "Madhya Pradesh", "510", "620", "330",
                "140", "90", "80", "70", "60", "50", "120", "260", "480",
            ],
            &[
                "Price", "2025-26", "Predicted Mid July", "Raj", "Madhya Pradesh", "2700", "2720",
                "2750",
            ],
            &[
                "Price", "2024-25", "Actual", "Raj", "Rajasthan", "2000", "2010", "2020", "2030",
                "2040", "2050", "2060", "2070", "2080", "2090", "2100", "2110",
            ],
        ],
    );
    write_sheet(
        dir.path(),
        "chana",
        &CHANA_IDS,
        &[
            &[
                "Price", "2024-2025", "Actual", "Madhya Pradesh", "5400", "5450", "NA", "5500",
                "5520", "5560", "5600", "5610", "5650", "5700", "5720", "5750",
            ],
            &[
                "Arrival", "2024-2025", "Actual", "Madhya Pradesh", "900", "850", "700", "650",
                "600", "500", "450", "400", "420", "600", "800", "950",
            ],
        ],
    );
    write_sheet(
        dir.path(),
        "shrimp",
        &SHRIMP_IDS,
        &[
            &[
                "Price", "2024-25", "Actual", "60C", "310", "305", "300", "298", "295", "300",
                "310", "320", "330", "335", "340", "345",
            ],
            &[
                "Price", "2024-25", "Predicted Mid July", "60C", "312", "306", "301", "297", "296",
                "302", "309", "318", "331", "336", "341", "344",
            ],
            &["Arrival", "2024-25", "Actual", "60C", "10", "11", "12"],
        ],
    );
    dir
}
