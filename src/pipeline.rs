//! クリーニング処理（`clean` コマンド本体）
//!
//! ## 処理フロー
//! 1. ファイル名から年を取得（なければスキップ）
//! 2. CSV読み込み → 前処理（重複削除・日付で絞り込み）
//! 3. バッチにデコードして正規化
//! 4. 固定の列順で `<接頭辞>_cleaned_<元ファイル名>` に出力
//!
//! ファイル同士は独立しているため rayon で並列に処理する。
//! 1ファイルの失敗は他のファイルに影響しない。

use crate::batch::{decode_batch, encode_rows, prepare_table, ColumnSet, PrepareStats};
use crate::cli::ExportFormat;
use crate::error::Result;
use crate::export::export_table;
use crate::normalizer::{NormalizationStats, Normalizer};
use crate::scanner::year_from_file_name;
use crate::sheet::{csv_io, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// クリーニングのオプション
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// 出力ファイル名の接頭辞
    pub prefix: String,
    pub format: ExportFormat,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            prefix: "City1".into(),
            format: ExportFormat::Csv,
        }
    }
}

/// 1ファイルの処理結果
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub input: PathBuf,
    pub year: i32,
    pub outputs: Vec<PathBuf>,
    pub prepare: PrepareStats,
    pub stats: NormalizationStats,
    pub table: Table,
}

#[derive(Debug, Clone)]
pub enum FileStatus {
    Cleaned(CleanOutcome),
    Skipped { input: PathBuf, reason: String },
}

/// 1ファイルをクリーニング
pub fn clean_file(
    normalizer: &Normalizer,
    input: &Path,
    output_dir: &Path,
    options: &CleanOptions,
) -> Result<FileStatus> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let skipped = |reason: &str| {
        tracing::warn!(file = %file_name, reason, "スキップ");
        Ok(FileStatus::Skipped { input: input.to_path_buf(), reason: reason.to_string() })
    };

    let Some(year) = year_from_file_name(&file_name) else {
        return skipped("ファイル名に年がありません");
    };

    let mut table = csv_io::read_csv(input)?;
    if table.headers.is_empty() || table.is_empty() {
        return skipped("空のファイル");
    }

    let prepare = prepare_table(&mut table, year)?;
    if prepare.kept == 0 {
        return skipped("該当年の行がありません");
    }

    let batch = decode_batch(&table, year);
    let columns = ColumnSet::of(&batch);
    let result = normalizer.normalize_batch(&batch);
    let cleaned = encode_rows(&result.rows, &columns);

    let output = output_dir.join(format!("{}_cleaned_{}", options.prefix, file_name));
    let outputs = export_table(&cleaned, &options.format, &output)?;

    Ok(FileStatus::Cleaned(CleanOutcome {
        input: input.to_path_buf(),
        year,
        outputs,
        prepare,
        stats: result.stats,
        table: cleaned,
    }))
}

/// 複数ファイルを並列にクリーニング（結果は入力順）
pub fn clean_files(
    normalizer: &Normalizer,
    files: &[PathBuf],
    output_dir: &Path,
    options: &CleanOptions,
    show_progress: bool,
) -> Vec<(PathBuf, Result<FileStatus>)> {
    let progress = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let results = files
        .par_iter()
        .map(|file| {
            let result = clean_file(normalizer, file, output_dir, options);
            if let Err(e) = &result {
                tracing::error!(file = %file.display(), error = %e, "クリーニング失敗");
            }
            progress.inc(1);
            (file.clone(), result)
        })
        .collect();

    progress.finish_and_clear();
    results
}

/// クリーニング結果を列の和集合で1つにまとめて出力
pub fn write_merged(outcomes: &[&CleanOutcome], format: &ExportFormat, output: &Path) -> Result<(usize, Vec<PathBuf>)> {
    let merged = Table::concat(outcomes.iter().copied().map(|o| &o.table));
    let written = export_table(&merged, format, output)?;
    Ok((merged.len(), written))
}
