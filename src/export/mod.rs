pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use crate::sheet::{csv_io, Table};
use std::path::{Path, PathBuf};

/// 出力パス（拡張子を差し替え）
fn output_path_for_format(output: &Path, extension: &str) -> PathBuf {
    output.with_extension(extension)
}

/// 表を指定形式で出力し、書き出したパスを返す
///
/// `output` の拡張子は形式に合わせて置き換える。
pub fn export_table(table: &Table, format: &ExportFormat, output: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        let path = output_path_for_format(output, "csv");
        csv_io::write_csv(table, &path)?;
        written.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_path_for_format(output, "xlsx");
        let sheet_name = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("cleaned");
        excel::generate_excel(table, &path, sheet_name)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_both() {
        let dir = tempdir().unwrap();
        let mut table = Table::new(vec!["Date".into(), "Helps".into()]);
        table.push_row(vec!["2023-01-01".into(), "2".into()]);

        let written = export_table(&table, &ExportFormat::Both, &dir.path().join("City1_cleaned_x.csv")).unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("City1_cleaned_x.csv").exists());
        assert!(dir.path().join("City1_cleaned_x.xlsx").exists());
    }

    #[test]
    fn test_export_csv_only() {
        let dir = tempdir().unwrap();
        let table = Table::new(vec!["Date".into()]);
        let written = export_table(&table, &ExportFormat::Csv, &dir.path().join("out.csv")).unwrap();
        assert_eq!(written, vec![dir.path().join("out.csv")]);
        assert!(!dir.path().join("out.xlsx").exists());
    }
}
