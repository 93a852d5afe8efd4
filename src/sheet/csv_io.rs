//! CSV読み書き

use super::Table;
use crate::error::{EtlError, Result};
use std::collections::HashSet;
use std::path::Path;

/// CSVを読み込む
///
/// 1行目をヘッダーとする。空ファイルはヘッダーなしの空の表になる。
/// 行ごとの列数の違いは許容する（ヘッダーに合わせて補完）。
pub fn read_csv(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(EtlError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Excel経由のBOMを除去
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut table = Table::new(unique_headers(headers));
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(path = %path.display(), rows = table.len(), "CSV読み込み");
    Ok(table)
}

/// 列名を一意にする
///
/// - 空の列名は `Unnamed: <列番号>`
/// - 重複した列名は2つ目以降を `<列名>.<n>`
///
/// 列名で連結しても名前のない列（追加の年齢列など）が失われないようにする。
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };

        let mut name = base.clone();
        let mut n = 0;
        while seen.contains(&name) {
            n += 1;
            name = format!("{}.{}", base, n);
        }
        seen.insert(name.clone());
        result.push(name);
    }

    result
}

/// CSVを書き出す（親フォルダがなければ作成）
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if table.headers.is_empty() {
        std::fs::write(path, "")?;
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = table.len(), "CSV書き出し");
    Ok(())
}
