//! CSVの結合・統合
//!
//! - `combine_yearly`: 月別CSVを年ごとに1ファイルへ結合
//! - `merge_cities`: 2拠点のデータを1つのデータセットに統合

use crate::batch::format_date;
use crate::error::{EtlError, Result};
use crate::sheet::csv_io::{read_csv, write_csv};
use crate::sheet::Table;
use booking_etl_common::types::columns;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// 脱出時間列とみなす列名（小文字・空白除去後）
const ESCAPE_TIME_ALIASES: &[&str] = &["duration", "timeescaped", "sessionlength"];

/// 統合時に削除する列
const CITY_DROP_COLUMNS: &[&str] = &[
    "Extra1", "Extra2", "Extra3", "Extra4", "Extra5", "Extra6", "Extra7", "Extra8", "Extra9",
    "Extra10", "Extra11", "Extra12", "Extra13", "Extra14", "Age7",
];

/// 統合時の列名変換（旧名, 新名）
const CITY_RENAMES: &[(&str, &str)] = &[
    ("OriginalPrice", "Price"),
    ("HelperCount", "Helpers"),
    ("SourceInfo", "Source"),
    ("TeamStatus", "Status"),
    ("Workers", "Staff"),
    ("Comments", "Notes"),
];

/// 年 → ファイル名一覧（JSON: `{"2023": ["jan.csv", "feb.csv"]}`）
pub type Manifest = BTreeMap<String, Vec<String>>;

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Err(EtlError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// 年ごとの結合結果
#[derive(Debug, Clone)]
pub struct CombineReport {
    pub year: String,
    pub output: PathBuf,
    pub rows: usize,
    pub included: Vec<String>,
    pub missing: Vec<String>,
}

/// 月別CSVを読み込み、1列目を `Date` に、脱出時間の列名を統一する
///
/// ファイルがない・空の場合は `None`。
fn read_monthly_csv(path: &Path) -> Result<Option<Table>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "ファイルがありません");
        return Ok(None);
    }

    let mut table = read_csv(path)?;
    if table.headers.is_empty() || table.is_empty() {
        tracing::warn!(path = %path.display(), "空のファイル");
        return Ok(None);
    }

    table.headers[0] = columns::DATE.to_string();
    table.map_column(columns::DATE, format_date);

    for header in table.headers.iter_mut() {
        let key = header.to_lowercase().replace(' ', "");
        if ESCAPE_TIME_ALIASES.contains(&key.as_str()) {
            *header = columns::ESCAPE_TIME.to_string();
        }
    }

    Ok(Some(table))
}

/// マニフェストに従って年ごとにCSVを結合
///
/// データのない年は空ファイルを作成する。
pub fn combine_yearly(input_dir: &Path, manifest: &Manifest, output_dir: &Path) -> Result<Vec<CombineReport>> {
    if !input_dir.is_dir() {
        return Err(EtlError::FolderNotFound(input_dir.display().to_string()));
    }
    std::fs::create_dir_all(output_dir)?;

    let mut reports = Vec::new();
    for (year, files) in manifest {
        let mut tables = Vec::new();
        let mut included = Vec::new();
        let mut missing = Vec::new();

        for file in files {
            match read_monthly_csv(&input_dir.join(file))? {
                Some(table) => {
                    tables.push(table);
                    included.push(file.clone());
                }
                None => missing.push(file.clone()),
            }
        }

        let output = output_dir.join(format!("combined_{}.csv", year));
        let rows = if tables.is_empty() {
            write_csv(&Table::default(), &output)?;
            0
        } else {
            let mut combined = Table::concat(&tables);
            combined.dedup_rows();
            write_csv(&combined, &output)?;
            combined.len()
        };

        tracing::info!(year = %year, rows, included = included.len(), missing = missing.len(), "年別結合");
        reports.push(CombineReport { year: year.clone(), output, rows, included, missing });
    }

    Ok(reports)
}

/// 2拠点統合のオプション
#[derive(Debug, Clone)]
pub struct CityMergeOptions {
    /// 拠点名（1つ目, 2つ目）
    pub city_names: (String, String),
    /// この件数未満の流入元は ONLINE にまとめる
    pub rare_threshold: usize,
}

impl Default for CityMergeOptions {
    fn default() -> Self {
        Self {
            city_names: ("City1".into(), "City2".into()),
            rare_threshold: 20,
        }
    }
}

/// 統合の統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityMergeReport {
    pub rows: usize,
    pub duplicates: usize,
    pub rare_sources: usize,
}

/// 料金から `E` を除いて整数にする（解析できなければ空）
fn price_to_integer(raw: &str) -> String {
    let value = raw.replace('E', "");
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", n as i64),
        _ => String::new(),
    }
}

/// 2拠点のクリーニング済みデータを統合
pub fn merge_cities(
    city1: &Path,
    city2: &Path,
    output: &Path,
    options: &CityMergeOptions,
) -> Result<CityMergeReport> {
    for path in [city1, city2] {
        if !path.exists() {
            return Err(EtlError::FileNotFound(path.display().to_string()));
        }
    }

    let load = |path: &Path, city: &str| -> Result<Table> {
        let mut table = read_csv(path)?;
        table.push_column("city", city);
        table.drop_columns(CITY_DROP_COLUMNS);
        Ok(table)
    };
    let first = load(city1, &options.city_names.0)?;
    let second = load(city2, &options.city_names.1)?;

    let mut merged = Table::concat([&first, &second]);
    for (from, to) in CITY_RENAMES {
        merged.rename_column(from, to);
    }

    merged.map_column("Price", price_to_integer);
    for name in [columns::ESCAPE_TIME, "EscapeTime"] {
        merged.map_column(name, |v| if v == "-" { String::new() } else { v.to_string() });
    }

    let mut report = CityMergeReport::default();
    if let Some(col) = merged.column_index(columns::SOURCE) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in &mut merged.rows {
            row[col] = row[col].trim().to_uppercase();
            *counts.entry(row[col].clone()).or_default() += 1;
        }
        for row in &mut merged.rows {
            let count = counts.get(&row[col]).copied().unwrap_or_default();
            if count < options.rare_threshold && !row[col].is_empty() {
                report.rare_sources += 1;
                row[col] = "ONLINE".into();
            } else if row[col].is_empty() {
                row[col] = "ONLINE".into();
            }
        }
    }

    report.duplicates = merged.dedup_rows();
    report.rows = merged.len();
    write_csv(&merged, output)?;

    tracing::info!(rows = report.rows, duplicates = report.duplicates, "2拠点統合");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_price_to_integer() {
        assert_eq!(price_to_integer("130E"), "130");
        assert_eq!(price_to_integer(" 30 "), "30");
        assert_eq!(price_to_integer("30.0"), "30");
        assert_eq!(price_to_integer(""), "");
        assert_eq!(price_to_integer("kupon"), "");
    }

    #[test]
    fn test_combine_yearly() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir(&input).unwrap();

        write(&input.join("jan.csv"), "Data,Session Length,Room Type\n2023-01-02 00:00:00,0:45:00,KV1\n2023-01-02 00:00:00,0:45:00,KV1\n");
        write(&input.join("feb.csv"), "Diena,Room Type,Admin\n2023-02-03,AS1,Ona\n");
        write(&input.join("empty.csv"), "");

        let mut manifest = Manifest::new();
        manifest.insert("2023".into(), vec!["jan.csv".into(), "feb.csv".into(), "empty.csv".into(), "mar.csv".into()]);
        manifest.insert("2024".into(), vec!["none.csv".into()]);

        let reports = combine_yearly(&input, &manifest, &output).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].rows, 2);
        assert_eq!(reports[0].included, vec!["jan.csv", "feb.csv"]);
        assert_eq!(reports[0].missing, vec!["empty.csv", "mar.csv"]);

        let combined = read_csv(&output.join("combined_2023.csv")).unwrap();
        assert_eq!(combined.headers, vec!["Date", "Escape Time", "Room Type", "Admin"]);
        assert_eq!(combined.rows[0], vec!["2023-01-02", "0:45:00", "KV1", ""]);
        assert_eq!(combined.rows[1], vec!["2023-02-03", "", "AS1", "Ona"]);

        assert_eq!(reports[1].rows, 0);
        assert_eq!(std::fs::read_to_string(output.join("combined_2024.csv")).unwrap(), "");
    }

    #[test]
    fn test_combine_keeps_unnamed_columns() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("jan.csv"), "Date,Room Type,Age,,,Source\n2023-01-02,AS1,,,35,FB\n");
        write(&dir.path().join("feb.csv"), "Date,Room Type,Age,,Source\n2023-02-03,KV1,,12,Google\n");

        let mut manifest = Manifest::new();
        manifest.insert("2023".into(), vec!["jan.csv".into(), "feb.csv".into()]);
        combine_yearly(dir.path(), &manifest, dir.path()).unwrap();

        let combined = read_csv(&dir.path().join("combined_2023.csv")).unwrap();
        assert_eq!(
            combined.headers,
            vec!["Date", "Room Type", "Age", "Unnamed: 3", "Unnamed: 4", "Source"]
        );
        assert_eq!(combined.rows[0], vec!["2023-01-02", "AS1", "", "", "35", "FB"]);
        assert_eq!(combined.rows[1], vec!["2023-02-03", "KV1", "", "12", "", "Google"]);
    }

    #[test]
    fn test_merge_cities() {
        let dir = tempdir().unwrap();
        let c1 = dir.path().join("c1.csv");
        let c2 = dir.path().join("c2.csv");
        write(&c1, "OriginalPrice,Escape Time,SourceInfo,Age7,Extra1\n130E,45.5,google,1,x\n30E,-,google,2,y\n30E,-,google,2,y\n");
        write(&c2, "OriginalPrice,Escape Time,SourceInfo,Comments\n40E,50.0,Google ,ok\n,55.0,,\n50E,-,fb,\n");

        let options = CityMergeOptions { rare_threshold: 3, ..Default::default() };
        let out = dir.path().join("full.csv");
        let report = merge_cities(&c1, &c2, &out, &options).unwrap();

        let merged = read_csv(&out).unwrap();
        assert_eq!(merged.headers, vec!["Price", "Escape Time", "Source", "city", "Notes"]);
        // 重複行は1行にまとめる
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.rows, 5);
        assert_eq!(merged.rows[0], vec!["130", "45.5", "GOOGLE", "City1", ""]);
        assert_eq!(merged.rows[1], vec!["30", "", "GOOGLE", "City1", ""]);
        assert_eq!(merged.rows[2], vec!["40", "50.0", "GOOGLE", "City2", "ok"]);
        // 空欄と少数派は ONLINE
        assert_eq!(merged.rows[3][2], "ONLINE");
        assert_eq!(merged.rows[4][2], "ONLINE");
        assert_eq!(report.rare_sources, 1);
    }

    #[test]
    fn test_merge_cities_missing_input() {
        let dir = tempdir().unwrap();
        let result = merge_cities(
            &dir.path().join("a.csv"),
            &dir.path().join("b.csv"),
            &dir.path().join("out.csv"),
            &CityMergeOptions::default(),
        );
        assert!(matches!(result, Err(EtlError::FileNotFound(_))));
    }
}
