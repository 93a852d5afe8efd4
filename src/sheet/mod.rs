//! 表データ（ヘッダー + 文字列セル）
//!
//! CSV/XLSXの入出力境界で使う素朴な表。セルはすべて文字列で保持し、
//! 欠けているセルは空文字として扱う。

pub mod csv_io;
pub mod xlsx;

use booking_etl_common::is_blank;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// 行を追加（列数はヘッダーに合わせて切り詰め・補完する）
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// セルの値（範囲外は ""）
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// 列名を変更（見つからなければ false）
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// 指定列を削除（存在しない列は無視）
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self.headers.iter().map(|h| !names.contains(&h.as_str())).collect();
        if keep.iter().all(|k| *k) {
            return;
        }

        let retain = |cells: &mut Vec<String>| {
            let mut i = 0;
            cells.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(true);
                i += 1;
                k
            });
        };
        retain(&mut self.headers);
        for row in &mut self.rows {
            retain(row);
        }
    }

    /// 全行に同じ値の列を追加
    pub fn push_column(&mut self, name: &str, value: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
    }

    /// 列の全セルを変換（列がなければ false）
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&str) -> String,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = f(cell);
            }
        }
        true
    }

    /// 空セルを直前の値で埋める（先頭の空セルはそのまま）
    pub fn forward_fill(&mut self, col: usize) {
        let mut last: Option<String> = None;
        for row in &mut self.rows {
            let Some(cell) = row.get_mut(col) else {
                continue;
            };
            if is_blank(cell) {
                if let Some(value) = &last {
                    *cell = value.clone();
                }
            } else {
                last = Some(cell.clone());
            }
        }
    }

    /// 重複行を削除（最初の出現を残す）。削除した行数を返す
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
        before - self.rows.len()
    }

    /// 複数の表を縦に連結する
    ///
    /// 列は出現順の和集合。ある表に存在しない列は空文字で埋める。
    /// 列名は表ごとに一意であること（`csv_io::read_csv` で読んだ表は一意）。
    pub fn concat<'a, I>(tables: I) -> Table
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let tables: Vec<&Table> = tables.into_iter().collect();

        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut merged = Table::new(headers);
        for table in tables {
            let mapping: Vec<Option<usize>> = merged
                .headers
                .iter()
                .map(|h| table.column_index(h))
                .collect();
            for row_idx in 0..table.len() {
                let row = mapping
                    .iter()
                    .map(|col| col.map(|c| table.cell(row_idx, c).to_string()).unwrap_or_default())
                    .collect();
                merged.rows.push(row);
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| c.to_string()).collect());
        }
        t
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let t = table(&["A", "B"], &[&["1"], &["1", "2", "3"]]);
        assert_eq!(t.rows[0], vec!["1", ""]);
        assert_eq!(t.rows[1], vec!["1", "2"]);
    }

    #[test]
    fn test_forward_fill() {
        let mut t = table(&["A"], &[&[""], &["x"], &[" "], &["y"], &[""]]);
        t.forward_fill(0);
        let values: Vec<_> = t.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(values, vec!["", "x", "x", "y", "y"]);
    }

    #[test]
    fn test_dedup_rows() {
        let mut t = table(&["A", "B"], &[&["1", "2"], &["1", "2"], &["1", "3"]]);
        assert_eq!(t.dedup_rows(), 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_drop_and_rename_columns() {
        let mut t = table(&["A", "B", "C"], &[&["1", "2", "3"]]);
        t.drop_columns(&["B", "Z"]);
        assert!(t.rename_column("C", "D"));
        assert!(!t.rename_column("B", "E"));
        assert_eq!(t.headers, vec!["A", "D"]);
        assert_eq!(t.rows[0], vec!["1", "3"]);
    }

    #[test]
    fn test_concat_column_union() {
        let a = table(&["Date", "Revenue"], &[&["2023-01-01", "30E"]]);
        let b = table(&["Date", "Admin"], &[&["2024-01-01", "ONA"]]);
        let merged = Table::concat([&a, &b]);

        assert_eq!(merged.headers, vec!["Date", "Revenue", "Admin"]);
        assert_eq!(merged.rows[0], vec!["2023-01-01", "30E", ""]);
        assert_eq!(merged.rows[1], vec!["2024-01-01", "", "ONA"]);
    }

    #[test]
    fn test_map_column() {
        let mut t = table(&["Source"], &[&["fb"], &["google"]]);
        assert!(t.map_column("Source", |s| s.to_uppercase()));
        assert!(!t.map_column("Missing", |s| s.to_string()));
        assert_eq!(t.cell(1, 0), "GOOGLE");
        assert_eq!(t.cell(5, 0), "");
    }
}
