//! Excel生成
//!
//! 1シートに表をそのまま書き出す。数値列（ヒント数・脱出時間）は数値セルにする。

use crate::error::Result;
use crate::sheet::Table;
use booking_etl_common::types::columns;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use std::path::Path;

/// 数値として書き込む列
const NUMERIC_COLUMNS: &[&str] = &[columns::HELPS, columns::ESCAPE_TIME];

/// シート名の最大長（Excelの制限）
const MAX_SHEET_NAME_LEN: usize = 31;

pub fn generate_excel(table: &Table, output_path: &Path, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(excel_sheet_name(sheet_name))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    let numeric: Vec<bool> = table
        .headers
        .iter()
        .map(|h| NUMERIC_COLUMNS.contains(&h.as_str()))
        .collect();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = row_idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) if numeric[col] => worksheet.write_number(excel_row, col as u16, n)?,
                _ => worksheet.write_string(excel_row, col as u16, value)?,
            };
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    workbook.save(output_path)?;

    tracing::debug!(path = %output_path.display(), rows = table.len(), "Excel書き出し");
    Ok(())
}

/// Excelで使えない文字を除き、31文字に切り詰める
fn excel_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_excel_sheet_name() {
        assert_eq!(excel_sheet_name("City1_cleaned_combined_data_2023"), "City1_cleaned_combined_data_202");
        assert_eq!(excel_sheet_name("a/b:c"), "abc");
        assert_eq!(excel_sheet_name("[]"), "Sheet1");
    }

    #[test]
    fn test_generate_excel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let mut table = Table::new(vec!["Date".into(), "Helps".into(), "Escape Time".into()]);
        table.push_row(vec!["2023-01-01".into(), "2".into(), "-".into()]);
        table.push_row(vec!["2023-01-02".into(), "0".into(), "45.5".into()]);

        generate_excel(&table, &path, "2023").unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }
}
