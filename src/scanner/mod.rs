//! 入力ファイルの検出

use crate::error::{EtlError, Result};
use glob::{MatchOptions, Pattern};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\d{4}").unwrap();
}

/// フォルダ直下からパターンに一致するファイルを探す（ファイル名順）
///
/// パターンはファイル名に対するglob（`*`, `?`, `[abc]`）。
pub fn scan_folder(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(EtlError::FolderNotFound(folder.display().to_string()));
    }

    let pattern = Pattern::new(pattern)
        .map_err(|e| EtlError::InvalidPattern(format!("{:?}: {}", pattern, e)))?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        // 隠しファイルは `*` に一致させない
        require_literal_leading_dot: true,
    };

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| pattern.matches_with(&e.file_name().to_string_lossy(), options))
        .map(|e| e.into_path())
        .collect();

    files.sort();
    Ok(files)
}

/// ファイル名から年（最初の4桁の数字）を取り出す
pub fn year_from_file_name(name: &str) -> Option<i32> {
    YEAR_RE.find(name).and_then(|m| m.as_str().parse().ok())
}
