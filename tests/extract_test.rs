//! XLSX抽出の統合テスト
//!
//! rust_xlsxwriter で結合セルを含むワークブックを作り、CSV抽出を検証

use booking_etl::sheet::csv_io::read_csv;
use booking_etl::sheet::xlsx::{extract_workbook, ExtractOptions, MERGED_PRICE_MARKER};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tempfile::tempdir;

fn build_workbook(path: &Path) {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Sausis 2023").unwrap();
    for (col, header) in ["Date", "Room Type", "Revenue", "Source"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "2023-01-05").unwrap();
    sheet.write_string(1, 1, "KV1").unwrap();
    sheet.write_string(2, 1, "AS1").unwrap();
    sheet.write_string(3, 1, "KS1").unwrap();
    sheet.merge_range(1, 2, 3, 2, "160", &Format::new()).unwrap();
    sheet.write_string(1, 3, "FB").unwrap();
    sheet.write_string(4, 0, "2023-01-06").unwrap();
    sheet.write_string(4, 1, "AV1").unwrap();
    sheet.write_number(4, 2, 90).unwrap();
    sheet.write_string(4, 3, "Google").unwrap();

    let notes = workbook.add_worksheet();
    notes.set_name("Pastabos").unwrap();
    notes.write_string(0, 0, "Note").unwrap();
    notes.write_string(1, 0, "nieko").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn test_extract_workbook_with_merged_prices() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("bookings.xlsx");
    build_workbook(&input);

    let out_dir = dir.path().join("extracted_data");
    let sheets = extract_workbook(&input, &out_dir, &ExtractOptions::default()).unwrap();

    // 料金列のないシートはスキップ
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].sheet_name, "Sausis 2023");
    assert_eq!(sheets[0].rows, 4);
    assert_eq!(sheets[0].path, out_dir.join("Sausis_2023.csv"));
    assert!(!out_dir.join("Pastabos.csv").exists());

    let table = read_csv(&sheets[0].path).unwrap();
    assert_eq!(table.headers, vec!["Date", "Room Type", "Revenue", "Source"]);

    let column = |name: &str| -> Vec<String> {
        let idx = table.column_index(name).unwrap();
        table.rows.iter().map(|r| r[idx].clone()).collect()
    };
    assert_eq!(
        column("Revenue"),
        vec!["160", MERGED_PRICE_MARKER, MERGED_PRICE_MARKER, "90"]
    );
    assert_eq!(column("Date"), vec!["2023-01-05", "2023-01-05", "2023-01-05", "2023-01-06"]);
    assert_eq!(column("Source"), vec!["FB", "FB", "FB", "Google"]);
    assert_eq!(column("Room Type"), vec!["KV1", "AS1", "KS1", "AV1"]);
}
