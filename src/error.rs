use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("CSV読み書きエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX読み込みエラー: {0}")]
    Xlsx(String),

    #[error("Excel生成エラー: {0}")]
    ExcelWrite(String),

    #[error("ファイルパターンが不正: {0}")]
    InvalidPattern(String),

    #[error("必要な列がありません: {0}")]
    MissingColumn(String),

    #[error("変換テーブルが不正: {0}")]
    InvalidTables(String),

    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] booking_etl_common::Error),
}

impl From<calamine::XlsxError> for EtlError {
    fn from(e: calamine::XlsxError) -> Self {
        EtlError::Xlsx(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for EtlError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        EtlError::ExcelWrite(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
