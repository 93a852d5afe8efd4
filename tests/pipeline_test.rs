//! クリーニング処理の統合テスト
//!
//! CSVファイルから正規化済みCSVまでを通しで検証

use booking_etl::cli::ExportFormat;
use booking_etl::normalizer::Normalizer;
use booking_etl::pipeline::{clean_file, clean_files, CleanOptions, FileStatus};
use booking_etl::scanner;
use booking_etl::sheet::csv_io::read_csv;
use booking_etl::sheet::Table;
use booking_etl_common::NormalizerTables;
use std::path::Path;
use tempfile::tempdir;

const INPUT_2023: &str = "\
Date,Time,Room Type,Revenue,Helps,Escape Time,Age,,Source,Status,Celebration,Admin
2023-03-01 00:00:00,18:10:00,KV1A,160,2,0:45:30,12,,Draugas paziurejo i FB,students,birthday_party,Ona
2023-03-01 00:00:00,,AS1,,1.7,,,35,,,,
2023-03-01 00:00:00,11:30,KS2,NO_PRICE,,1:00,,,LOOKED_ONLINE,,,
2023-03-02 00:00:00,13:00,AV1,COUPON,x,nepabego,,,RECEIVED_COUPON,\" , \",christmas,jonas!
2023-03-02 00:00:00,21:00,AS2,45,0,0:52:10,20,,Kaimynai,kazkas,kazkas,
2023-03-03 00:00:00,20:00,PETRAS,300,,,,,,,,
2022-12-31 00:00:00,20:00,KV1,90,,,,,,,,
nepavyko,20:00,KV1,90,,,,,,,,
";

fn normalizer() -> Normalizer {
    Normalizer::new(&NormalizerTables::default()).expect("テーブルが不正")
}

fn column<'a>(table: &'a Table, name: &str) -> Vec<&'a str> {
    let idx = table.column_index(name).unwrap_or_else(|| panic!("列がない: {}", name));
    table.rows.iter().map(|r| r[idx].as_str()).collect()
}

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("入力ファイル作成失敗");
    path
}

fn clean_2023(dir: &Path) -> Table {
    let input = write_input(dir, "combined_data_2023.csv", INPUT_2023);
    let out_dir = dir.join("cleaned");
    let status = clean_file(&normalizer(), &input, &out_dir, &CleanOptions::default())
        .expect("クリーニング失敗");
    assert!(matches!(status, FileStatus::Cleaned(_)));

    read_csv(&out_dir.join("City1_cleaned_combined_data_2023.csv")).expect("出力読み込み失敗")
}

/// 出力の列順
#[test]
fn test_output_column_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    assert_eq!(
        table.headers,
        vec![
            "Date", "Time", "Room Type", "Revenue", "Helps", "Escape Time", "Age", "Age1",
            "Age Group", "TeamType", "Source", "Status", "Celebration", "Admin",
        ]
    );
}

/// 別の年・日付不正・除外部屋の行は出力されない
#[test]
fn test_rows_filtered() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    assert_eq!(table.len(), 5);
    assert_eq!(column(&table, "Room Type"), vec!["KV1", "AS1", "KS2", "AV1", "AS2"]);
    assert!(column(&table, "Date").iter().all(|d| d.starts_with("2023-03-0")));
}

/// 結合セルの料金復元（2023年の既定料金は50）
#[test]
fn test_revenue_reconstruction() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    // 160 のブロック（3行）→ 60, 50, 50。クーポン → 50。45 は既定値未満なので 50
    assert_eq!(column(&table, "Revenue"), vec!["60E", "50E", "50E", "50E", "50E"]);
}

#[test]
fn test_time_rounding_and_fill() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    assert_eq!(column(&table, "Time"), vec!["18:00", "18:00", "10:00", "12:00", "20:00"]);
}

#[test]
fn test_scalar_fields() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    assert_eq!(column(&table, "Helps"), vec!["2", "1", "0", "0", "0"]);
    assert_eq!(column(&table, "Escape Time"), vec!["45.5", "-", "60.0", "-", "52.17"]);
    assert_eq!(column(&table, "Admin"), vec!["ONA", "ONA", "ONA", "JONAS", "JONAS"]);
}

#[test]
fn test_categorical_fields() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    assert_eq!(
        column(&table, "Source"),
        vec!["SOCIAL_MEDIA", "ONLINE", "ONLINE", "COUPON", "KAIMYNAI"]
    );
    assert_eq!(column(&table, "Status"), vec!["Students", "Draugai", "Draugai", "Draugai", "Kita"]);
    assert_eq!(
        column(&table, "Celebration"),
        vec!["Birthday", "Be šventės", "Be šventės", "Holiday", "Be šventės"]
    );
}

#[test]
fn test_demographics() {
    let dir = tempdir().expect("Failed to create temp dir");
    let table = clean_2023(dir.path());

    // KV1: 12歳 / AS1: 35歳 / KS2: 年齢なし / AV1: 年齢なし / AS2: 20歳
    assert_eq!(column(&table, "Age Group"), vec!["10–13", "30–40", "25–29", "10–13", "19–24"]);
    assert_eq!(column(&table, "TeamType"), vec!["Kids", "Grown-up", "Grown-up", "Kids", "Grown-up"]);
}

/// 再実行しても同じ結果になる
#[test]
fn test_clean_is_deterministic() {
    let first = clean_2023(tempdir().expect("Failed to create temp dir").path());
    let second = clean_2023(tempdir().expect("Failed to create temp dir").path());
    assert_eq!(first, second);
}

/// フォルダ単位の処理（パターン一致・並列処理・Excel出力）
#[test]
fn test_clean_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_input(dir.path(), "combined_data_2023.csv", INPUT_2023);
    write_input(dir.path(), "combined_data_2024.csv", "Date,Room Type,Revenue\n2024-05-01,KS1,\n");
    write_input(dir.path(), "combined_data_nera.csv", "Date,Room Type\n2024-05-01,KS1\n");
    write_input(dir.path(), "other_2024.csv", "Date,Room Type\n2024-05-01,KS1\n");

    let files = scanner::scan_folder(dir.path(), "combined_data_*.csv").expect("スキャン失敗");
    assert_eq!(files.len(), 3);

    let out_dir = dir.path().join("cleaned");
    let options = CleanOptions { prefix: "City1".into(), format: ExportFormat::Both };
    let results = clean_files(&normalizer(), &files, &out_dir, &options, false);

    let cleaned = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(FileStatus::Cleaned(_))))
        .count();
    let skipped = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(FileStatus::Skipped { .. })))
        .count();
    assert_eq!(cleaned, 2);
    assert_eq!(skipped, 1);

    assert!(out_dir.join("City1_cleaned_combined_data_2024.xlsx").exists());
    let cleaned_2024 = read_csv(&out_dir.join("City1_cleaned_combined_data_2024.csv")).unwrap();
    assert_eq!(column(&cleaned_2024, "Revenue"), vec!["80E"]);
}

/// カスタムテーブル（既定料金の上書き）
#[test]
fn test_custom_tables() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_input(dir.path(), "combined_data_2030.csv", "Date,Room Type,Revenue\n2030-01-01,KS1,\n");

    let tables = NormalizerTables::from_json(r#"{"default_prices": {"2030": "200E"}}"#).unwrap();
    let normalizer = Normalizer::new(&tables).unwrap();
    let status = clean_file(&normalizer, &input, dir.path(), &CleanOptions::default()).unwrap();

    let FileStatus::Cleaned(outcome) = status else {
        panic!("クリーニングされていない");
    };
    assert_eq!(column(&outcome.table, "Revenue"), vec!["200E"]);
}
