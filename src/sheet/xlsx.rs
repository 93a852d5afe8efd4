//! XLSX → CSV 抽出
//!
//! ## 処理フロー
//! 1. ワークブックを開き、結合セル情報を読み込む
//! 2. シートごとに1行目をヘッダーとして表に変換
//! 3. 料金列の結合セル（先頭セル以外）を `NO_PRICE` に置換
//! 4. 先頭2列と流入元列の空セルを直前の値で補完
//! 5. シート名をファイル名に使える形にしてCSVを保存

use super::{csv_io, Table};
use crate::error::Result;
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::Timelike;
use std::path::{Path, PathBuf};

/// 結合セルの後続行に入れる印
pub const MERGED_PRICE_MARKER: &str = "NO_PRICE";

/// 抽出オプション
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// 料金列のヘッダー名
    pub price_column: String,
    /// 流入元列のヘッダー名
    pub source_column: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            price_column: "Revenue".into(),
            source_column: "Source".into(),
        }
    }
}

/// 結合範囲（0始まりの絶対位置、両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub start: (u32, u32),
    pub end: (u32, u32),
}

/// 抽出したシート
#[derive(Debug, Clone)]
pub struct ExtractedSheet {
    pub sheet_name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// ワークブックの全シートをCSVに抽出
///
/// 料金列のないシートは警告を出してスキップする。
pub fn extract_workbook(
    path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<Vec<ExtractedSheet>> {
    if !path.exists() {
        return Err(crate::error::EtlError::FileNotFound(path.display().to_string()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    workbook.load_merged_regions()?;
    std::fs::create_dir_all(output_dir)?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut extracted = Vec::new();

    for sheet_name in &sheet_names {
        let merged: Vec<MergedRegion> = workbook
            .merged_regions_by_sheet(sheet_name)
            .into_iter()
            .map(|(_, _, dims)| MergedRegion { start: dims.start, end: dims.end })
            .collect();

        let range = workbook.worksheet_range(sheet_name)?;
        let grid: Vec<Vec<String>> = match range.end() {
            Some((last_row, last_col)) => (0..=last_row)
                .map(|r| {
                    (0..=last_col)
                        .map(|c| range.get_value((r, c)).map(cell_to_string).unwrap_or_default())
                        .collect()
                })
                .collect(),
            None => Vec::new(),
        };

        let Some(table) = sheet_to_table(grid, &merged, options) else {
            tracing::warn!(sheet = %sheet_name, column = %options.price_column, "料金列がないためスキップ");
            println!("  ⚠ '{}' が見つかりません: {}", options.price_column, sheet_name);
            continue;
        };

        let csv_path = output_dir.join(format!("{}.csv", safe_sheet_name(sheet_name)));
        csv_io::write_csv(&table, &csv_path)?;
        println!("  ✔ 保存: {}", csv_path.display());

        extracted.push(ExtractedSheet {
            sheet_name: sheet_name.clone(),
            path: csv_path,
            rows: table.len(),
        });
    }

    Ok(extracted)
}

/// シートのセル格子を表に変換（料金列がなければ `None`）
pub fn sheet_to_table(
    grid: Vec<Vec<String>>,
    merged: &[MergedRegion],
    options: &ExtractOptions,
) -> Option<Table> {
    let mut rows = grid.into_iter();
    let headers = rows.next()?;
    let price_col = headers.iter().position(|h| h == &options.price_column)?;

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row);
    }

    // 格子の行 r は表の行 r-1（0行目はヘッダー）
    for region in merged.iter().filter(|m| m.start.1 as usize == price_col) {
        for grid_row in (region.start.0 + 1)..=region.end.0 {
            if let Some(row) = (grid_row as usize).checked_sub(1).and_then(|r| table.rows.get_mut(r)) {
                row[price_col] = MERGED_PRICE_MARKER.to_string();
            }
        }
    }

    for col in 0..table.headers.len().min(2) {
        table.forward_fill(col);
    }
    if let Some(col) = table.column_index(&options.source_column) {
        table.forward_fill(col);
    }

    Some(table)
}

/// ファイル名に使えない文字を `_` に置換
pub fn safe_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dt.as_datetime() {
                // 時刻のみのセル
                Some(value) if serial < 1.0 => value.format("%H:%M:%S").to_string(),
                Some(value) if value.num_seconds_from_midnight() == 0 => {
                    value.format("%Y-%m-%d").to_string()
                }
                Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => serial.to_string(),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
