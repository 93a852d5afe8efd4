use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "booking-etl")]
#[command(about = "予約ログ表の正規化・料金復元ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// XLSXの全シートをCSVに抽出
    Extract {
        /// 入力XLSXファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力フォルダ（デフォルト: 入力ファイルと同じ場所の extracted_data）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 料金列の名前（省略時は設定値）
        #[arg(long)]
        price_column: Option<String>,

        /// 流入元列の名前（省略時は設定値）
        #[arg(long)]
        source_column: Option<String>,
    },

    /// 月別CSVを年ごとに結合
    Combine {
        /// 月別CSVのフォルダ
        #[arg(required = true)]
        input: PathBuf,

        /// 年 → ファイル名一覧のJSON
        #[arg(short, long, required = true)]
        manifest: PathBuf,

        /// 出力フォルダ（デフォルト: 入力フォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 年別CSVを正規化
    Clean {
        /// 入力フォルダ
        #[arg(required = true)]
        input: PathBuf,

        /// 出力フォルダ（デフォルト: 入力フォルダ/cleaned）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 入力ファイルのパターン（省略時は設定値）
        #[arg(short, long)]
        pattern: Option<String>,

        /// 変換テーブルJSON（省略時は設定値またはプリセット）
        #[arg(short, long)]
        tables: Option<PathBuf>,

        /// 全年の結果をまとめたファイルも出力
        #[arg(short, long)]
        merged: Option<PathBuf>,

        /// 出力形式 (csv/excel/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// 出力ファイル名の接頭辞（省略時は設定値）
        #[arg(long)]
        prefix: Option<String>,
    },

    /// 2拠点のクリーニング済みデータを統合
    Merge {
        /// 1つ目の拠点のCSV
        #[arg(required = true)]
        first: PathBuf,

        /// 2つ目の拠点のCSV
        #[arg(required = true)]
        second: PathBuf,

        /// 出力CSV
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// この件数未満の流入元を ONLINE にまとめる
        #[arg(long, default_value = "20")]
        rare_threshold: usize,

        /// 拠点名（1つ目）
        #[arg(long, default_value = "City1")]
        first_name: String,

        /// 拠点名（2つ目）
        #[arg(long, default_value = "City2")]
        second_name: String,
    },

    /// 変換テーブルを表示/書き出し
    Tables {
        /// JSONファイルに書き出す
        #[arg(long)]
        dump: Option<PathBuf>,

        /// 表示するテーブルJSON（省略時は設定値またはプリセット）
        #[arg(short, long)]
        tables: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 変換テーブルJSONを設定
        #[arg(long)]
        set_tables: Option<PathBuf>,

        /// 出力ファイル名の接頭辞を設定
        #[arg(long)]
        set_prefix: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use csv, excel, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}
