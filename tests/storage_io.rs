use comtrade_rs::models::{FlowType, TradeRecord, TradeTable};
use comtrade_rs::storage;
use std::fs;

fn sample(n: usize) -> TradeTable {
    (0..n)
        .map(|i| TradeRecord {
            classification: "H4".into(),
            year: 2010 + i as i32,
            flow: FlowType::Export,
            reporter_code: "276".into(),
            reporter_name: "Germany".into(),
            partner_code: "250".into(),
            partner_name: "France".into(),
            commodity_code: "TOTAL".into(),
            commodity_name: "All Commodities".into(),
            trade_value: 100.0 + i as f64,
        })
        .collect()
}

#[test]
fn save_csv_and_json() {
    let rows = sample(3);
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("trade.csv");
    storage::save_csv(&rows, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("classification,year,flow,"));
    assert_eq!(csv_txt.lines().count(), 1 + rows.len());

    let json_path = dir.path().join("trade.json");
    storage::save_json(&rows, &json_path).unwrap();
    let json_txt = fs::read_to_string(&json_path).unwrap();
    let back: TradeTable = serde_json::from_str(&json_txt).unwrap();
    assert_eq!(back, rows);
}

// Cells starting with =, +, -, @ are evaluated as formulas by spreadsheet
// apps; they must be written with a leading single quote.
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let mut table = sample(1).into_rows();
    table[0].reporter_name = "=HYPERLINK(\"http://evil\")".into();
    table[0].partner_name = "+SUM(A1:A9)".into();
    table[0].commodity_name = "@foo".into();
    let table = TradeTable::from(table);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("injection.csv");
    storage::save_csv(&table, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    let row = rdr.records().next().expect("one data row expected").unwrap();
    let cell = |name: &str| {
        let idx = headers.iter().position(|h| h == name).expect("header present");
        row.get(idx).unwrap().to_string()
    };

    for (col, needle) in [
        ("reporter_name", "=HYPERLINK"),
        ("partner_name", "+SUM"),
        ("commodity_name", "@foo"),
    ] {
        let v = cell(col);
        assert!(v.starts_with('\''), "{col} not prefixed: {v}");
        assert!(v.contains(needle), "{col} content changed: {v}");
    }
    // numeric and flow columns are untouched
    assert_eq!(cell("flow"), "Export");
    assert_eq!(cell("trade_value"), "100.0");
}

#[test]
fn missing_value_survives_json_round_trip() {
    let mut rows = sample(1).into_rows();
    rows[0].trade_value = f64::NAN;
    let table = TradeTable::from(rows);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nan.json");
    storage::save_json(&table, &path).unwrap();
    let back: TradeTable = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(back.rows()[0].trade_value.is_nan());
}
